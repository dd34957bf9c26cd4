use soroban_sdk::{
    auth::{ContractContext, InvokerContractAuthEntry, SubContractInvocation},
    token, Address, Env, IntoVal, Symbol, Vec,
};

use crate::storage::{is_native, read_native_asset, to_i128};

/// Tagged asset class behind the unified entry points. Native is spoken for
/// by the sentinel address; everything else is an ordinary token.
pub enum AssetKind {
    Native,
    Token(Address),
}

pub fn classify(env: &Env, underlying: &Address) -> AssetKind {
    if is_native(env, underlying) {
        AssetKind::Native
    } else {
        AssetKind::Token(underlying.clone())
    }
}

/// The token contract that actually moves value for this asset class.
pub fn resolved_token(env: &Env, kind: &AssetKind) -> Address {
    match kind {
        AssetKind::Native => read_native_asset(env),
        AssetKind::Token(address) => address.clone(),
    }
}

/// Move `amount` from the owner into gateway custody. Native value is
/// pushed directly under the owner's authorization; tokens are pulled
/// against the allowance the owner granted the gateway beforehand.
pub fn pull_into_custody(env: &Env, kind: &AssetKind, owner: &Address, amount: u128) {
    let this = env.current_contract_address();
    let client = token::Client::new(env, &resolved_token(env, kind));
    match kind {
        AssetKind::Native => client.transfer(owner, &this, &to_i128(amount)),
        AssetKind::Token(_) => client.transfer_from(&this, owner, &this, &to_i128(amount)),
    }
}

/// Forward `amount` out of gateway custody to the recipient.
pub fn push_from_custody(env: &Env, kind: &AssetKind, to: &Address, amount: u128) {
    let this = env.current_contract_address();
    let client = token::Client::new(env, &resolved_token(env, kind));
    client.transfer(&this, to, &to_i128(amount));
}

/// Authorize the pool's upcoming draw of exactly `amount` from gateway
/// custody. The authorization covers one transfer for one amount; nothing
/// residual is left behind.
pub fn authorize_pool_draw(env: &Env, token: &Address, pool: &Address, amount: u128) {
    let this = env.current_contract_address();
    let context = ContractContext {
        contract: token.clone(),
        fn_name: Symbol::new(env, "transfer"),
        args: (this, pool.clone(), to_i128(amount)).into_val(env),
    };
    let mut auths = Vec::new(env);
    auths.push_back(InvokerContractAuthEntry::Contract(SubContractInvocation {
        context,
        sub_invocations: Vec::new(env),
    }));
    env.authorize_as_current_contract(auths);
}
