#![no_std]
use soroban_sdk::{
    contract, contractimpl, contracttype, Address, Env, IntoVal, Map, Symbol, Vec,
};

#[contracttype]
pub enum DataKey {
    Admin,
    SupportedMarkets,     // Map<Address, bool>
    UserMarkets(Address), // Vec<Address>
    Price(Address),       // u128 scaled 1e6, per underlying token
    MarketCF(Address),    // u128 scaled 1e6, per market
}

const SCALE_1E6: u128 = 1_000_000u128;

/// Cross-market liquidity engine used as the external collaborator in
/// tests. Markets are entered per account; liquidity sums every entered
/// market except the one currently borrowing, which keeps the borrow path
/// free of reentrant market calls.
#[contract]
pub struct MockRiskEngine;

#[contractimpl]
impl MockRiskEngine {
    pub fn initialize(env: Env, admin: Address) {
        if env
            .storage()
            .persistent()
            .get::<_, Address>(&DataKey::Admin)
            .is_some()
        {
            panic!("already initialized");
        }
        env.storage().persistent().set(&DataKey::Admin, &admin);
    }

    pub fn add_market(env: Env, market: Address) {
        require_admin(&env);
        let mut markets: Map<Address, bool> = env
            .storage()
            .persistent()
            .get(&DataKey::SupportedMarkets)
            .unwrap_or(Map::new(&env));
        markets.set(market, true);
        env.storage()
            .persistent()
            .set(&DataKey::SupportedMarkets, &markets);
    }

    /// Flat per-token price in account units, scaled 1e6.
    pub fn set_price(env: Env, token: Address, price_scaled: u128) {
        require_admin(&env);
        env.storage()
            .persistent()
            .set(&DataKey::Price(token), &price_scaled);
    }

    pub fn set_collateral_factor(env: Env, market: Address, cf_scaled: u128) {
        require_admin(&env);
        if cf_scaled > SCALE_1E6 {
            panic!("invalid collateral factor");
        }
        env.storage()
            .persistent()
            .set(&DataKey::MarketCF(market), &cf_scaled);
    }

    pub fn enter_market(env: Env, account: Address, market: Address) {
        account.require_auth();
        let markets: Map<Address, bool> = env
            .storage()
            .persistent()
            .get(&DataKey::SupportedMarkets)
            .unwrap_or(Map::new(&env));
        if !markets.get(market.clone()).unwrap_or(false) {
            panic!("market not supported");
        }
        let mut entered: Vec<Address> = env
            .storage()
            .persistent()
            .get(&DataKey::UserMarkets(account.clone()))
            .unwrap_or(Vec::new(&env));
        if !entered.contains(market.clone()) {
            entered.push_back(market);
            env.storage()
                .persistent()
                .set(&DataKey::UserMarkets(account), &entered);
        }
    }

    pub fn get_user_markets(env: Env, account: Address) -> Vec<Address> {
        env.storage()
            .persistent()
            .get(&DataKey::UserMarkets(account))
            .unwrap_or(Vec::new(&env))
    }

    /// (liquidity, shortfall) across all entered markets.
    pub fn account_liquidity(env: Env, account: Address) -> (u128, u128) {
        let (collateral, borrows) = sum_positions(&env, &account, None);
        if collateral >= borrows {
            (collateral - borrows, 0u128)
        } else {
            (0u128, borrows - collateral)
        }
    }

    /// Liquidity after a hypothetical borrow of `borrow_amount` units of
    /// `underlying` from `market`. The borrowing market is excluded from
    /// the sums (no reentrant call back into it).
    pub fn hypothetical_liquidity(
        env: Env,
        account: Address,
        market: Address,
        borrow_amount: u128,
        underlying: Address,
    ) -> (u128, u128) {
        let (collateral, mut borrows) = sum_positions(&env, &account, Some(market));
        let price = price_of(&env, &underlying);
        borrows = borrows.saturating_add((borrow_amount.saturating_mul(price)) / SCALE_1E6);
        if collateral >= borrows {
            (collateral - borrows, 0u128)
        } else {
            (0u128, borrows - collateral)
        }
    }
}

fn require_admin(env: &Env) {
    let admin: Address = env
        .storage()
        .persistent()
        .get(&DataKey::Admin)
        .expect("engine not initialized");
    admin.require_auth();
}

fn price_of(env: &Env, token: &Address) -> u128 {
    let price: u128 = env
        .storage()
        .persistent()
        .get(&DataKey::Price(token.clone()))
        .unwrap_or(0u128);
    if price == 0 {
        panic!("price unavailable");
    }
    price
}

/// Collateral (factor-weighted) and borrow totals in account units across
/// the account's entered markets, skipping `exclude`.
fn sum_positions(env: &Env, account: &Address, exclude: Option<Address>) -> (u128, u128) {
    let mut collateral: u128 = 0u128;
    let mut borrows: u128 = 0u128;
    let markets: Vec<Address> = env
        .storage()
        .persistent()
        .get(&DataKey::UserMarkets(account.clone()))
        .unwrap_or(Vec::new(env));
    for market in markets.iter() {
        if exclude.as_ref() == Some(&market) {
            continue;
        }
        let underlying: Address = env.invoke_contract(
            &market,
            &Symbol::new(env, "get_underlying"),
            ().into_val(env),
        );
        let price = price_of(env, &underlying);

        let receipts: u128 = env.invoke_contract(
            &market,
            &Symbol::new(env, "receipt_balance"),
            (account.clone(),).into_val(env),
        );
        if receipts > 0 {
            let rate: u128 = env.invoke_contract(
                &market,
                &Symbol::new(env, "exchange_rate_current"),
                ().into_val(env),
            );
            let value = (receipts.saturating_mul(rate)) / SCALE_1E6;
            let cf: u128 = env
                .storage()
                .persistent()
                .get(&DataKey::MarketCF(market.clone()))
                .unwrap_or(500_000u128);
            let weighted = (value.saturating_mul(cf)) / SCALE_1E6;
            collateral = collateral.saturating_add((weighted.saturating_mul(price)) / SCALE_1E6);
        }

        let debt: u128 = env.invoke_contract(
            &market,
            &Symbol::new(env, "borrow_balance_current"),
            (account.clone(),).into_val(env),
        );
        if debt > 0 {
            borrows = borrows.saturating_add((debt.saturating_mul(price)) / SCALE_1E6);
        }
    }
    (collateral, borrows)
}
