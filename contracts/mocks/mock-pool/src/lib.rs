#![no_std]
use soroban_sdk::{
    contract, contractimpl, contracttype, token, Address, Env, IntoVal, Symbol,
};

// Storage key types for the contract
#[contracttype]
pub enum DataKey {
    Admin,
    Underlying,
    ReceiptBalance(Address),
    TotalReceipts,
    BorrowSnapshot(Address), // BorrowSnapshot per account
    TotalBorrowed,           // u128
    BorrowIndex,             // u128 (scaled 1e18)
    BorrowYearlyRateScaled,  // u128, scaled 1e6
    CollateralFactorScaled,  // u128, scaled 1e6 (e.g., 500_000 = 50%)
    RiskEngine,              // Address (optional)
    LastUpdateTime,          // u64
    Initialized,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BorrowSnapshot {
    pub principal: u128,
    pub interest_index: u128,
}

const SCALE_1E6: u128 = 1_000_000u128;
const INDEX_SCALE_1E18: u128 = 1_000_000_000_000_000_000u128; // 1e18
const SECONDS_PER_YEAR: u128 = 365 * 24 * 60 * 60;

/// Single-market lending pool used as the external collaborator in tests.
/// Receipt accounting, a global borrow index and the optional risk-engine
/// consult follow the production vault this repo integrates against.
#[contract]
pub struct MockPool;

#[contractimpl]
impl MockPool {
    /// Rates and factors are scaled by 1e6 (e.g., 10% = 100_000)
    pub fn initialize(
        env: Env,
        admin: Address,
        underlying: Address,
        borrow_yearly_rate_scaled: u128,
        collateral_factor_scaled: u128,
    ) {
        if env
            .storage()
            .persistent()
            .get::<_, bool>(&DataKey::Initialized)
            .unwrap_or(false)
        {
            panic!("already initialized");
        }
        if collateral_factor_scaled > SCALE_1E6 {
            panic!("invalid collateral factor");
        }
        let storage = env.storage().persistent();
        storage.set(&DataKey::Admin, &admin);
        storage.set(&DataKey::Underlying, &underlying);
        storage.set(&DataKey::TotalReceipts, &0u128);
        storage.set(&DataKey::TotalBorrowed, &0u128);
        storage.set(&DataKey::BorrowIndex, &INDEX_SCALE_1E18);
        storage.set(&DataKey::BorrowYearlyRateScaled, &borrow_yearly_rate_scaled);
        storage.set(&DataKey::CollateralFactorScaled, &collateral_factor_scaled);
        storage.set(&DataKey::LastUpdateTime, &env.ledger().timestamp());
        storage.set(&DataKey::Initialized, &true);
    }

    /// Deposit underlying from `from` and mint receipt tokens to `from`.
    /// Returns the receipts minted at the pre-deposit exchange rate.
    pub fn mint(env: Env, from: Address, amount: u128) -> u128 {
        Self::accrue_interest(env.clone());
        from.require_auth();
        if amount == 0 {
            panic!("bad amount");
        }
        let underlying = get_underlying_or_panic(&env);

        // Rate must reflect the pool before the new cash arrives.
        let rate = current_exchange_rate(&env);
        token::Client::new(&env, &underlying).transfer(
            &from,
            &env.current_contract_address(),
            &to_i128(amount),
        );
        let receipts = (amount.saturating_mul(SCALE_1E6)) / rate;
        if receipts == 0 {
            panic!("deposit too small");
        }

        let balance = Self::receipt_balance(env.clone(), from.clone());
        env.storage()
            .persistent()
            .set(&DataKey::ReceiptBalance(from), &(balance + receipts));
        let total: u128 = env
            .storage()
            .persistent()
            .get(&DataKey::TotalReceipts)
            .unwrap_or(0u128);
        env.storage()
            .persistent()
            .set(&DataKey::TotalReceipts, &(total + receipts));
        receipts
    }

    /// Burn `receipt_amount` receipts held by `from` and return the
    /// underlying they redeem for at the current exchange rate.
    pub fn redeem(env: Env, from: Address, receipt_amount: u128) -> u128 {
        Self::accrue_interest(env.clone());
        from.require_auth();
        let balance = Self::receipt_balance(env.clone(), from.clone());
        if balance < receipt_amount {
            panic!("insufficient receipt tokens");
        }
        let underlying = get_underlying_or_panic(&env);

        let rate = current_exchange_rate(&env);
        let underlying_out = (receipt_amount.saturating_mul(rate)) / SCALE_1E6;
        if cash(&env, &underlying) < underlying_out {
            panic!("not enough liquidity");
        }

        env.storage()
            .persistent()
            .set(&DataKey::ReceiptBalance(from.clone()), &(balance - receipt_amount));
        let total: u128 = env
            .storage()
            .persistent()
            .get(&DataKey::TotalReceipts)
            .unwrap_or(0u128);
        env.storage()
            .persistent()
            .set(&DataKey::TotalReceipts, &(total - receipt_amount));

        token::Client::new(&env, &underlying).transfer(
            &env.current_contract_address(),
            &from,
            &to_i128(underlying_out),
        );
        underlying_out
    }

    /// Borrow underlying against receipt collateral. The risk engine's
    /// verdict is authoritative when one is configured; otherwise the
    /// pool falls back to its own collateral-factor check.
    pub fn borrow(env: Env, to: Address, amount: u128) {
        Self::accrue_interest(env.clone());
        to.require_auth();
        if amount == 0 {
            panic!("bad amount");
        }
        let underlying = get_underlying_or_panic(&env);

        if let Some(engine) = env
            .storage()
            .persistent()
            .get::<_, Address>(&DataKey::RiskEngine)
        {
            let (_liquidity, shortfall): (u128, u128) = env.invoke_contract(
                &engine,
                &Symbol::new(&env, "hypothetical_liquidity"),
                (
                    to.clone(),
                    env.current_contract_address(),
                    amount,
                    underlying.clone(),
                )
                    .into_val(&env),
            );
            if shortfall > 0 {
                panic!("insufficient collateral");
            }
        } else {
            let rate = current_exchange_rate(&env);
            let receipts = Self::receipt_balance(env.clone(), to.clone());
            let collateral_value = (receipts.saturating_mul(rate)) / SCALE_1E6;
            let factor: u128 = env
                .storage()
                .persistent()
                .get(&DataKey::CollateralFactorScaled)
                .unwrap_or(500_000u128);
            let max_borrow = (collateral_value.saturating_mul(factor)) / SCALE_1E6;
            let debt = account_debt(&env, &to);
            if debt.saturating_add(amount) > max_borrow {
                panic!("insufficient collateral");
            }
        }

        if cash(&env, &underlying) < amount {
            panic!("not enough liquidity");
        }

        let new_principal = account_debt(&env, &to).saturating_add(amount);
        write_borrow_snapshot(&env, to.clone(), new_principal);
        let total: u128 = env
            .storage()
            .persistent()
            .get(&DataKey::TotalBorrowed)
            .unwrap_or(0u128);
        env.storage()
            .persistent()
            .set(&DataKey::TotalBorrowed, &total.saturating_add(amount));

        token::Client::new(&env, &underlying).transfer(
            &env.current_contract_address(),
            &to,
            &to_i128(amount),
        );
    }

    /// Repay up to the live debt; returns the amount actually applied.
    pub fn repay_borrow(env: Env, from: Address, amount: u128) -> u128 {
        Self::accrue_interest(env.clone());
        from.require_auth();
        let debt = account_debt(&env, &from);
        if debt == 0 {
            return 0u128;
        }
        let applied = if amount > debt { debt } else { amount };
        let underlying = get_underlying_or_panic(&env);
        token::Client::new(&env, &underlying).transfer(
            &from,
            &env.current_contract_address(),
            &to_i128(applied),
        );

        write_borrow_snapshot(&env, from.clone(), debt - applied);
        let total: u128 = env
            .storage()
            .persistent()
            .get(&DataKey::TotalBorrowed)
            .unwrap_or(0u128);
        env.storage()
            .persistent()
            .set(&DataKey::TotalBorrowed, &total.saturating_sub(applied));
        applied
    }

    /// Live interest-inclusive debt for an account.
    pub fn borrow_balance_current(env: Env, account: Address) -> u128 {
        Self::accrue_interest(env.clone());
        account_debt(&env, &account)
    }

    /// Receipt-to-underlying rate, scaled 1e6. Non-decreasing as borrow
    /// interest accrues.
    pub fn exchange_rate_current(env: Env) -> u128 {
        Self::accrue_interest(env.clone());
        current_exchange_rate(&env)
    }

    pub fn receipt_balance(env: Env, account: Address) -> u128 {
        env.storage()
            .persistent()
            .get(&DataKey::ReceiptBalance(account))
            .unwrap_or(0u128)
    }

    pub fn get_underlying(env: Env) -> Address {
        get_underlying_or_panic(&env)
    }

    pub fn get_total_borrowed(env: Env) -> u128 {
        env.storage()
            .persistent()
            .get(&DataKey::TotalBorrowed)
            .unwrap_or(0u128)
    }

    pub fn set_risk_engine(env: Env, engine: Address) {
        require_admin(&env);
        env.storage().persistent().set(&DataKey::RiskEngine, &engine);
    }

    pub fn set_collateral_factor(env: Env, factor_scaled: u128) {
        require_admin(&env);
        if factor_scaled > SCALE_1E6 {
            panic!("invalid collateral factor");
        }
        env.storage()
            .persistent()
            .set(&DataKey::CollateralFactorScaled, &factor_scaled);
    }

    /// Accrue borrow interest for elapsed ledger time via the global index.
    pub fn accrue_interest(env: Env) {
        let last: u64 = env
            .storage()
            .persistent()
            .get(&DataKey::LastUpdateTime)
            .unwrap_or(env.ledger().timestamp());
        let now = env.ledger().timestamp();
        if now <= last {
            return;
        }
        let elapsed = (now - last) as u128;

        let total_prior: u128 = env
            .storage()
            .persistent()
            .get(&DataKey::TotalBorrowed)
            .unwrap_or(0u128);
        let yearly_rate: u128 = env
            .storage()
            .persistent()
            .get(&DataKey::BorrowYearlyRateScaled)
            .unwrap_or(0u128);
        if total_prior > 0 && yearly_rate > 0 {
            let numerator = total_prior
                .saturating_mul(yearly_rate)
                .saturating_mul(elapsed);
            let interest = numerator / (SECONDS_PER_YEAR.saturating_mul(SCALE_1E6));
            if interest > 0 {
                env.storage()
                    .persistent()
                    .set(&DataKey::TotalBorrowed, &total_prior.saturating_add(interest));

                let old_index: u128 = env
                    .storage()
                    .persistent()
                    .get(&DataKey::BorrowIndex)
                    .unwrap_or(INDEX_SCALE_1E18);
                let delta = (old_index.saturating_mul(interest)) / total_prior;
                env.storage()
                    .persistent()
                    .set(&DataKey::BorrowIndex, &old_index.saturating_add(delta));
            }
        }

        env.storage().persistent().set(&DataKey::LastUpdateTime, &now);
    }
}

fn get_underlying_or_panic(env: &Env) -> Address {
    env.storage()
        .persistent()
        .get(&DataKey::Underlying)
        .expect("pool not initialized")
}

fn require_admin(env: &Env) {
    let admin: Address = env
        .storage()
        .persistent()
        .get(&DataKey::Admin)
        .expect("pool not initialized");
    admin.require_auth();
}

/// Underlying actually held by the pool.
fn cash(env: &Env, underlying: &Address) -> u128 {
    let balance = token::Client::new(env, underlying).balance(&env.current_contract_address());
    if balance < 0 {
        panic!("negative cash");
    }
    balance as u128
}

/// rate = (cash + total_borrowed) * 1e6 / total_receipts
fn current_exchange_rate(env: &Env) -> u128 {
    let total_receipts: u128 = env
        .storage()
        .persistent()
        .get(&DataKey::TotalReceipts)
        .unwrap_or(0u128);
    if total_receipts == 0 {
        return SCALE_1E6;
    }
    let underlying = get_underlying_or_panic(env);
    let total_borrowed: u128 = env
        .storage()
        .persistent()
        .get(&DataKey::TotalBorrowed)
        .unwrap_or(0u128);
    let total_underlying = cash(env, &underlying).saturating_add(total_borrowed);
    (total_underlying.saturating_mul(SCALE_1E6)) / total_receipts
}

fn account_debt(env: &Env, account: &Address) -> u128 {
    let snapshot: Option<BorrowSnapshot> = env
        .storage()
        .persistent()
        .get(&DataKey::BorrowSnapshot(account.clone()));
    let Some(snapshot) = snapshot else {
        return 0u128;
    };
    if snapshot.principal == 0 {
        return 0u128;
    }
    let index: u128 = env
        .storage()
        .persistent()
        .get(&DataKey::BorrowIndex)
        .unwrap_or(INDEX_SCALE_1E18);
    (snapshot.principal.saturating_mul(index)) / snapshot.interest_index
}

fn write_borrow_snapshot(env: &Env, account: Address, principal: u128) {
    let index: u128 = env
        .storage()
        .persistent()
        .get(&DataKey::BorrowIndex)
        .unwrap_or(INDEX_SCALE_1E18);
    let snapshot = BorrowSnapshot {
        principal,
        interest_index: index,
    };
    env.storage()
        .persistent()
        .set(&DataKey::BorrowSnapshot(account), &snapshot);
}

fn to_i128(amount: u128) -> i128 {
    if amount > i128::MAX as u128 {
        panic!("amount exceeds i128");
    }
    amount as i128
}
