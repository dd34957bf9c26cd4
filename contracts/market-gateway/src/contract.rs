use soroban_sdk::{contract, contractimpl, Address, Env};

use crate::events::{BorrowTaken, Deposited, Repaid, Withdrawn};
use crate::helpers::{
    authorize_pool_draw, classify, pull_into_custody, push_from_custody, resolved_token, AssetKind,
};
use crate::storage::{bump_core_ttl, read_native_asset, read_owner, DataKey};
use crate::{LendingPoolClient, RiskEngineClient};

/// Owner-operated money-market gateway. Presents one deposit / withdraw /
/// borrow / repay surface for the native asset and arbitrary tokens against
/// external lending pools. The gateway is the pool-side account: receipts
/// and debt accrue to its address, funds only pass through it within a
/// single invocation, and every balance is re-read live from the pool.
#[contract]
pub struct MarketGateway;

#[contractimpl]
impl MarketGateway {
    pub fn initialize(env: Env, owner: Address, native_asset: Address) {
        if env
            .storage()
            .persistent()
            .get::<_, bool>(&DataKey::Initialized)
            .unwrap_or(false)
        {
            panic!("already initialized");
        }
        owner.require_auth();
        let storage = env.storage().persistent();
        storage.set(&DataKey::Owner, &owner);
        storage.set(&DataKey::NativeAsset, &native_asset);
        storage.set(&DataKey::Initialized, &true);
        bump_core_ttl(&env);
    }

    /// Supply `amount` of `underlying` to `pool` as collateral. Pass the
    /// native sentinel as `underlying` for the native asset; any other
    /// address is pulled against the owner's prior approval. Pool
    /// rejections propagate unmodified.
    pub fn deposit(env: Env, underlying: Address, pool: Address, amount: u128) {
        let owner = read_owner(&env);
        owner.require_auth();
        if amount == 0 {
            panic!("bad amount");
        }

        let kind = classify(&env, &underlying);
        pull_into_custody(&env, &kind, &owner, amount);
        authorize_pool_draw(&env, &resolved_token(&env, &kind), &pool, amount);
        let receipts_minted =
            LendingPoolClient::new(&env, &pool).mint(&env.current_contract_address(), &amount);

        Deposited {
            owner,
            underlying,
            amount,
            receipts_minted,
        }
        .publish(&env);
    }

    /// Redeem `receipt_amount` receipts from `pool` and forward the
    /// underlying they are worth at the current exchange rate to the owner.
    pub fn withdraw(env: Env, receipt_amount: u128, pool: Address, underlying: Address) {
        let owner = read_owner(&env);
        owner.require_auth();

        let this = env.current_contract_address();
        let pool_client = LendingPoolClient::new(&env, &pool);
        if pool_client.receipt_balance(&this) < receipt_amount {
            panic!("INSUFFICIENT cTOKEN BALANCE");
        }

        let amount_returned = pool_client.redeem(&this, &receipt_amount);
        let kind = classify(&env, &underlying);
        push_from_custody(&env, &kind, &owner, amount_returned);

        Withdrawn {
            owner,
            underlying,
            receipt_amount,
            amount_returned,
        }
        .publish(&env);
    }

    /// Borrow `amount` of `underlying` from `pool` against collateral held
    /// in `collateral_pool`. Both markets are registered with the risk
    /// engine first; the pool's own verdict on the borrow is final.
    pub fn borrow(
        env: Env,
        underlying: Address,
        pool: Address,
        collateral_pool: Address,
        risk_engine: Address,
        amount: u128,
    ) {
        let owner = read_owner(&env);
        owner.require_auth();
        if amount == 0 {
            panic!("bad amount");
        }

        let this = env.current_contract_address();
        let kind = classify(&env, &underlying);
        if LendingPoolClient::new(&env, &collateral_pool).receipt_balance(&this) == 0 {
            match kind {
                AssetKind::Native => panic!("DEPOSIT TOKENS FIRST"),
                AssetKind::Token(_) => panic!("DEPOSIT SAID TOKEN FIRST"),
            }
        }

        let engine = RiskEngineClient::new(&env, &risk_engine);
        engine.enter_market(&this, &collateral_pool);
        if collateral_pool != pool {
            engine.enter_market(&this, &pool);
        }

        match LendingPoolClient::new(&env, &pool).try_borrow(&this, &amount) {
            Ok(Ok(())) => (),
            _ => panic!("BORROW FAILED: NOT ENOUGH COLLATERAL"),
        }
        push_from_custody(&env, &kind, &owner, amount);

        BorrowTaken {
            owner,
            underlying,
            amount,
        }
        .publish(&env);
    }

    /// Repay `amount` of `underlying` debt owed to `pool`. The live,
    /// interest-inclusive borrow balance is re-read at call time and caps
    /// what the owner may repay.
    pub fn repay(env: Env, pool: Address, underlying: Address, amount: u128) {
        let owner = read_owner(&env);
        owner.require_auth();
        if amount == 0 {
            panic!("bad amount");
        }

        let this = env.current_contract_address();
        let pool_client = LendingPoolClient::new(&env, &pool);
        if amount > pool_client.borrow_balance_current(&this) {
            panic!("REPAY AMOUNT MORE THAN BORROWED AMOUNT");
        }

        let kind = classify(&env, &underlying);
        pull_into_custody(&env, &kind, &owner, amount);
        authorize_pool_draw(&env, &resolved_token(&env, &kind), &pool, amount);
        pool_client.repay_borrow(&this, &amount);
        let remaining_debt = pool_client.borrow_balance_current(&this);

        Repaid {
            owner,
            underlying,
            amount,
            remaining_debt,
        }
        .publish(&env);
    }

    pub fn get_owner(env: Env) -> Address {
        read_owner(&env)
    }

    pub fn get_native_asset(env: Env) -> Address {
        read_native_asset(&env)
    }

    /// Live receipt balance held by the gateway in `pool`.
    pub fn receipt_balance(env: Env, pool: Address) -> u128 {
        LendingPoolClient::new(&env, &pool).receipt_balance(&env.current_contract_address())
    }

    /// Live interest-inclusive debt owed by the gateway to `pool`.
    pub fn borrow_balance(env: Env, pool: Address) -> u128 {
        LendingPoolClient::new(&env, &pool).borrow_balance_current(&env.current_contract_address())
    }
}
