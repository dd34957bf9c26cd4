use soroban_sdk::{contractevent, Address};

/// Emitted when underlying enters the pool and receipts are minted to the
/// gateway's pool account.
#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Deposited {
    #[topic]
    pub owner: Address,
    pub underlying: Address,
    pub amount: u128,
    pub receipts_minted: u128,
}

/// Emitted when receipts are redeemed and the underlying is forwarded to
/// the owner.
#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Withdrawn {
    #[topic]
    pub owner: Address,
    pub underlying: Address,
    pub receipt_amount: u128,
    pub amount_returned: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BorrowTaken {
    #[topic]
    pub owner: Address,
    pub underlying: Address,
    pub amount: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Repaid {
    #[topic]
    pub owner: Address,
    pub underlying: Address,
    pub amount: u128,
    pub remaining_debt: u128,
}
