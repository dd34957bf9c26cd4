#![cfg(test)]

use super::*;
use market_gateway::{MarketGateway as Gateway, MarketGatewayClient as GatewayClient};
use mock_pool::{MockPool, MockPoolClient};
use mock_risk_engine::{MockRiskEngine, MockRiskEngineClient};
use soroban_sdk::testutils::{Address as _, Ledger};
use soroban_sdk::{token, Address, Env};

struct Setup {
    env: Env,
    admin: Address,
    owner: Address,
    native: Address,
    dai: Address,
    native_pool: Address,
    dai_pool: Address,
    engine: Address,
    gateway: Address,
    leverage: Address,
}

/// One market per asset with lender liquidity and a generous 80%
/// collateral factor, so a half-tranche loop has room to run. The pools
/// keep their own collateral check; the engine only registers markets.
fn setup() -> Setup {
    let env = Env::default();
    env.mock_all_auths();
    env.ledger().with_mut(|l| l.timestamp = 1);

    let admin = Address::generate(&env);
    let owner = Address::generate(&env);
    let lender = Address::generate(&env);

    let native = env.register_stellar_asset_contract_v2(admin.clone()).address();
    let dai = env.register_stellar_asset_contract_v2(admin.clone()).address();
    token::StellarAssetClient::new(&env, &native).mint(&owner, &10_000i128);
    token::StellarAssetClient::new(&env, &native).mint(&lender, &10_000i128);
    token::StellarAssetClient::new(&env, &dai).mint(&owner, &10_000i128);
    token::StellarAssetClient::new(&env, &dai).mint(&lender, &10_000i128);

    let native_pool = env.register(MockPool, ());
    let dai_pool = env.register(MockPool, ());
    MockPoolClient::new(&env, &native_pool).initialize(&admin, &native, &0u128, &800_000u128);
    MockPoolClient::new(&env, &dai_pool).initialize(&admin, &dai, &0u128, &800_000u128);
    MockPoolClient::new(&env, &native_pool).mint(&lender, &5_000u128);
    MockPoolClient::new(&env, &dai_pool).mint(&lender, &5_000u128);

    let engine = env.register(MockRiskEngine, ());
    let engine_client = MockRiskEngineClient::new(&env, &engine);
    engine_client.initialize(&admin);
    engine_client.add_market(&native_pool);
    engine_client.add_market(&dai_pool);
    engine_client.set_price(&native, &1_000_000u128);
    engine_client.set_price(&dai, &1_000_000u128);

    let gateway = env.register(Gateway, ());
    GatewayClient::new(&env, &gateway).initialize(&owner, &native);

    let leverage = env.register(Leverage, ());
    LeverageClient::new(&env, &leverage).initialize(&admin, &500_000u128, &2u32);

    Setup {
        env,
        admin,
        owner,
        native,
        dai,
        native_pool,
        dai_pool,
        engine,
        gateway,
        leverage,
    }
}

#[test]
fn test_initialize_and_params() {
    let s = setup();
    let client = LeverageClient::new(&s.env, &s.leverage);
    assert_eq!(client.get_admin(), s.admin);
    assert_eq!(client.get_borrow_factor(), 500_000u128);
    assert_eq!(client.get_rounds(), 2u32);

    client.set_params(&750_000u128, &3u32);
    assert_eq!(client.get_borrow_factor(), 750_000u128);
    assert_eq!(client.get_rounds(), 3u32);
}

#[test]
#[should_panic(expected = "already initialized")]
fn test_initialize_twice_rejected() {
    let s = setup();
    LeverageClient::new(&s.env, &s.leverage).initialize(&s.admin, &500_000u128, &2u32);
}

#[test]
#[should_panic(expected = "invalid borrow factor")]
fn test_full_tranche_factor_rejected() {
    let s = setup();
    LeverageClient::new(&s.env, &s.leverage).set_params(&1_000_000u128, &2u32);
}

#[test]
#[should_panic(expected = "invalid rounds")]
fn test_zero_rounds_rejected() {
    let s = setup();
    LeverageClient::new(&s.env, &s.leverage).set_params(&500_000u128, &0u32);
}

#[test]
fn test_leverage_native_builds_expected_position() {
    let s = setup();
    let gateway = GatewayClient::new(&s.env, &s.gateway);
    let native = token::Client::new(&s.env, &s.native);

    LeverageClient::new(&s.env, &s.leverage).leverage_native(
        &s.owner,
        &s.gateway,
        &s.native_pool,
        &s.engine,
        &1_000u128,
    );

    // 1000 deposited, then 500 and 250 borrowed and re-deposited.
    assert_eq!(gateway.receipt_balance(&s.native_pool), 1_750u128);
    assert_eq!(gateway.borrow_balance(&s.native_pool), 750u128);
    // Only the initial stake net-left the owner; every tranche round-tripped.
    assert_eq!(native.balance(&s.owner), 9_000i128);
    assert_eq!(native.balance(&s.native_pool), 6_000i128);
}

#[test]
fn test_leverage_token_consumes_approval_per_tranche() {
    let s = setup();
    let gateway = GatewayClient::new(&s.env, &s.gateway);
    let dai = token::Client::new(&s.env, &s.dai);

    dai.approve(&s.owner, &s.gateway, &2_000i128, &1_000u32);
    LeverageClient::new(&s.env, &s.leverage).leverage_token(
        &s.owner,
        &s.gateway,
        &s.dai_pool,
        &s.engine,
        &s.dai,
        &1_000u128,
    );

    assert_eq!(gateway.receipt_balance(&s.dai_pool), 1_750u128);
    assert_eq!(gateway.borrow_balance(&s.dai_pool), 750u128);
    assert_eq!(dai.balance(&s.owner), 9_000i128);
    // 1000 + 500 + 250 pulled through the allowance.
    assert_eq!(dai.allowance(&s.owner, &s.gateway), 250i128);
}

#[test]
fn test_tiny_stake_stops_before_first_round() {
    let s = setup();
    let gateway = GatewayClient::new(&s.env, &s.gateway);

    LeverageClient::new(&s.env, &s.leverage).leverage_native(
        &s.owner,
        &s.gateway,
        &s.native_pool,
        &s.engine,
        &1u128,
    );

    // The half-tranche of 1 rounds to zero, so only the stake lands.
    assert_eq!(gateway.receipt_balance(&s.native_pool), 1u128);
    assert_eq!(gateway.borrow_balance(&s.native_pool), 0u128);
}

#[test]
fn test_failed_round_unwinds_whole_position() {
    let s = setup();
    let gateway = GatewayClient::new(&s.env, &s.gateway);
    let native = token::Client::new(&s.env, &s.native);
    let leverage = LeverageClient::new(&s.env, &s.leverage);

    // A 90% tranche against a 50% collateral factor fails on round one.
    MockPoolClient::new(&s.env, &s.native_pool).set_collateral_factor(&500_000u128);
    leverage.set_params(&900_000u128, &2u32);

    let result = leverage.try_leverage_native(
        &s.owner,
        &s.gateway,
        &s.native_pool,
        &s.engine,
        &1_000u128,
    );
    assert!(result.is_err());

    // The initial deposit unwound along with the failed borrow.
    assert_eq!(gateway.receipt_balance(&s.native_pool), 0u128);
    assert_eq!(gateway.borrow_balance(&s.native_pool), 0u128);
    assert_eq!(native.balance(&s.owner), 10_000i128);
    assert_eq!(native.balance(&s.native_pool), 5_000i128);
}

#[test]
#[should_panic(expected = "bad amount")]
fn test_zero_stake_rejected() {
    let s = setup();
    LeverageClient::new(&s.env, &s.leverage).leverage_native(
        &s.owner,
        &s.gateway,
        &s.native_pool,
        &s.engine,
        &0u128,
    );
}
