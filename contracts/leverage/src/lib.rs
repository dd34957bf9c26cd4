#![no_std]
use soroban_sdk::{contract, contractevent, contractimpl, contracttype, Address, Env};

/// Gateway surface the orchestrator drives. Deposits and borrows both run
/// under the owner's authorization; balances are read live from the pool.
#[soroban_sdk::contractclient(name = "MarketGatewayClient")]
pub trait MarketGateway {
    fn deposit(env: Env, underlying: Address, pool: Address, amount: u128);
    fn borrow(
        env: Env,
        underlying: Address,
        pool: Address,
        collateral_pool: Address,
        risk_engine: Address,
        amount: u128,
    );
    fn receipt_balance(env: Env, pool: Address) -> u128;
    fn borrow_balance(env: Env, pool: Address) -> u128;
    fn get_native_asset(env: Env) -> Address;
}

// Storage key types for the contract
#[contracttype]
pub enum DataKey {
    Admin,
    BorrowFactorScaled, // u128, scaled 1e6, fraction re-borrowed each round
    Rounds,             // u32
    Initialized,
}

/// Emitted after a position is fully built.
#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LeverageBuilt {
    #[topic]
    pub owner: Address,
    pub underlying: Address,
    pub rounds_run: u32,
    pub total_deposited: u128,
    pub total_borrowed: u128,
}

const SCALE_1E6: u128 = 1_000_000u128;
const MAX_ROUNDS: u32 = 10;

/// Builds a leveraged same-asset position through the gateway: deposit,
/// then repeatedly borrow a fraction of the last tranche and deposit it
/// back. The whole loop is one invocation, so a failed round unwinds every
/// earlier deposit and borrow with it.
#[contract]
pub struct Leverage;

#[contractimpl]
impl Leverage {
    /// `borrow_factor_scaled` is the per-round re-borrow fraction, scaled
    /// by 1e6 and strictly below it; positions never borrow a full tranche.
    pub fn initialize(env: Env, admin: Address, borrow_factor_scaled: u128, rounds: u32) {
        if env
            .storage()
            .persistent()
            .get::<_, bool>(&DataKey::Initialized)
            .unwrap_or(false)
        {
            panic!("already initialized");
        }
        admin.require_auth();
        check_params(borrow_factor_scaled, rounds);
        let storage = env.storage().persistent();
        storage.set(&DataKey::Admin, &admin);
        storage.set(&DataKey::BorrowFactorScaled, &borrow_factor_scaled);
        storage.set(&DataKey::Rounds, &rounds);
        storage.set(&DataKey::Initialized, &true);
    }

    pub fn set_params(env: Env, borrow_factor_scaled: u128, rounds: u32) {
        require_admin(&env);
        check_params(borrow_factor_scaled, rounds);
        let storage = env.storage().persistent();
        storage.set(&DataKey::BorrowFactorScaled, &borrow_factor_scaled);
        storage.set(&DataKey::Rounds, &rounds);
    }

    /// Build a leveraged native-asset position of `initial_amount` for
    /// `owner` in `pool` via `gateway`.
    pub fn leverage_native(
        env: Env,
        owner: Address,
        gateway: Address,
        pool: Address,
        risk_engine: Address,
        initial_amount: u128,
    ) {
        let underlying = MarketGatewayClient::new(&env, &gateway).get_native_asset();
        Self::build_position(&env, owner, gateway, pool, risk_engine, underlying, initial_amount);
    }

    /// Token variant of the loop. The owner's gateway approval must cover
    /// the initial deposit plus every re-deposited tranche.
    pub fn leverage_token(
        env: Env,
        owner: Address,
        gateway: Address,
        pool: Address,
        risk_engine: Address,
        token: Address,
        initial_amount: u128,
    ) {
        Self::build_position(&env, owner, gateway, pool, risk_engine, token, initial_amount);
    }

    pub fn get_admin(env: Env) -> Address {
        env.storage()
            .persistent()
            .get(&DataKey::Admin)
            .expect("not initialized")
    }

    pub fn get_borrow_factor(env: Env) -> u128 {
        env.storage()
            .persistent()
            .get(&DataKey::BorrowFactorScaled)
            .expect("not initialized")
    }

    pub fn get_rounds(env: Env) -> u32 {
        env.storage()
            .persistent()
            .get(&DataKey::Rounds)
            .expect("not initialized")
    }

    fn build_position(
        env: &Env,
        owner: Address,
        gateway: Address,
        pool: Address,
        risk_engine: Address,
        underlying: Address,
        initial_amount: u128,
    ) {
        owner.require_auth();
        if initial_amount == 0 {
            panic!("bad amount");
        }
        let factor = Self::get_borrow_factor(env.clone());
        let rounds = Self::get_rounds(env.clone());

        let client = MarketGatewayClient::new(env, &gateway);
        client.deposit(&underlying, &pool, &initial_amount);

        let mut total_deposited = initial_amount;
        let mut total_borrowed = 0u128;
        let mut rounds_run = 0u32;
        let mut tranche = initial_amount;
        for _ in 0..rounds {
            tranche = (tranche.saturating_mul(factor)) / SCALE_1E6;
            if tranche == 0 {
                break;
            }
            client.borrow(&underlying, &pool, &pool, &risk_engine, &tranche);
            client.deposit(&underlying, &pool, &tranche);
            total_borrowed += tranche;
            total_deposited += tranche;
            rounds_run += 1;
        }

        LeverageBuilt {
            owner,
            underlying,
            rounds_run,
            total_deposited,
            total_borrowed,
        }
        .publish(env);
    }
}

fn check_params(borrow_factor_scaled: u128, rounds: u32) {
    if borrow_factor_scaled == 0 || borrow_factor_scaled >= SCALE_1E6 {
        panic!("invalid borrow factor");
    }
    if rounds == 0 || rounds > MAX_ROUNDS {
        panic!("invalid rounds");
    }
}

fn require_admin(env: &Env) {
    let admin: Address = env
        .storage()
        .persistent()
        .get(&DataKey::Admin)
        .expect("not initialized");
    admin.require_auth();
}

mod test;
