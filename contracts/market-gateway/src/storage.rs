use soroban_sdk::{contracttype, Address, Env};

// Storage key types for the contract
#[contracttype]
pub enum DataKey {
    Owner,       // Address the gateway operates for
    NativeAsset, // wrapped-native SAC address, doubles as the native sentinel
    Initialized, // bool flag to prevent re-initialization
}

const TTL_THRESHOLD: u32 = 100_000;
const TTL_EXTEND_TO: u32 = 200_000;

pub fn read_owner(env: &Env) -> Address {
    bump_core_ttl(env);
    env.storage()
        .persistent()
        .get(&DataKey::Owner)
        .expect("gateway not initialized")
}

pub fn read_native_asset(env: &Env) -> Address {
    env.storage()
        .persistent()
        .get(&DataKey::NativeAsset)
        .expect("gateway not initialized")
}

/// The native sentinel is the configured wrapped-native address itself.
pub fn is_native(env: &Env, underlying: &Address) -> bool {
    read_native_asset(env) == *underlying
}

pub fn bump_core_ttl(env: &Env) {
    let persistent = env.storage().persistent();
    if persistent.has(&DataKey::Owner) {
        persistent.extend_ttl(&DataKey::Owner, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
    if persistent.has(&DataKey::NativeAsset) {
        persistent.extend_ttl(&DataKey::NativeAsset, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
    if persistent.has(&DataKey::Initialized) {
        persistent.extend_ttl(&DataKey::Initialized, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
}

pub fn to_i128(amount: u128) -> i128 {
    if amount > i128::MAX as u128 {
        panic!("amount exceeds i128");
    }
    amount as i128
}
