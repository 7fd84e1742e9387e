//! Shared storage utilities for TapRace contracts.
#![no_std]
#![allow(unexpected_cfgs)]

use soroban_sdk::{Env, IntoVal, Val};

/// Persistent storage TTL in ledgers (~30 days at 5 s/ledger).
/// Bumped on every write so balances and round data never expire mid-game.
pub const PERSISTENT_BUMP_LEDGERS: u32 = 518_400;

/// Extend a persistent entry's TTL to the shared policy window.
pub fn extend_persistent_ttl<K>(env: &Env, key: &K)
where
    K: IntoVal<Env, Val>,
{
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_BUMP_LEDGERS, PERSISTENT_BUMP_LEDGERS);
}

/// Write a persistent entry and bump its TTL in one step.
pub fn set_persistent<K, V>(env: &Env, key: &K, val: &V)
where
    K: IntoVal<Env, Val>,
    V: IntoVal<Env, Val>,
{
    env.storage().persistent().set(key, val);
    extend_persistent_ttl(env, key);
}
