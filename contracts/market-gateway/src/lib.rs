#![no_std]
use soroban_sdk::{Address, Env};

/// Lending-pool primitives the gateway relies on, one market per pool
/// address. The pool owns every balance; the gateway only routes.
#[soroban_sdk::contractclient(name = "LendingPoolClient")]
pub trait LendingPool {
    fn mint(env: Env, from: Address, amount: u128) -> u128;
    fn redeem(env: Env, from: Address, receipt_amount: u128) -> u128;
    fn borrow(env: Env, to: Address, amount: u128);
    fn repay_borrow(env: Env, from: Address, amount: u128) -> u128;
    fn borrow_balance_current(env: Env, account: Address) -> u128;
    fn exchange_rate_current(env: Env) -> u128;
    fn receipt_balance(env: Env, account: Address) -> u128;
}

/// Market registration surface of the risk engine consulted by the pools.
#[soroban_sdk::contractclient(name = "RiskEngineClient")]
pub trait RiskEngine {
    fn enter_market(env: Env, account: Address, market: Address);
}

mod contract;
mod events;
mod helpers;
mod storage;

pub use crate::contract::{MarketGateway, MarketGatewayClient};
pub use crate::storage::DataKey;
