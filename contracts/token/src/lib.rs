//! TapRace Token Contract
//!
//! The fungible stake token spent on taps. SEP-41-shaped surface so the game
//! contract (and anything else holding a `soroban_sdk::token::TokenClient`)
//! can drive it like any other token, plus admin minting under a hard supply
//! cap.
//!
//! ## Storage Strategy
//! - `instance()`: Admin. Fixed-size contract config.
//! - `persistent()`: TotalSupply, per-account Balance entries, and
//!   per-(owner, spender) Allowance entries, TTL-bumped on every write.
//!
//! ## Invariant
//! Balances never go negative (every debit checks first), total supply
//! equals the sum of all balances, and supply never exceeds `MAX_SUPPLY`.
#![no_std]
#![allow(unexpected_cfgs)]

use soroban_sdk::{
    contract, contracterror, contractevent, contractimpl, contracttype, Address, Env, String,
};
use taprace_shared::set_persistent;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Stellar minor-unit convention.
pub const DECIMALS: u32 = 7;

/// 10,000,000 TAPRACE minted to the admin at initialization.
pub const INITIAL_SUPPLY: i128 = 100_000_000_000_000;

/// Hard cap of 100,000,000 TAPRACE; `mint` beyond this fails.
pub const MAX_SUPPLY: i128 = 1_000_000_000_000_000;

// ---------------------------------------------------------------------------
// Error Types
// ---------------------------------------------------------------------------

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    NotAuthorized = 3,
    InvalidAmount = 4,
    InsufficientBalance = 5,
    InsufficientAllowance = 6,
    SupplyCapExceeded = 7,
    InvalidExpiration = 8,
    Overflow = 9,
}

// ---------------------------------------------------------------------------
// Storage Types
// ---------------------------------------------------------------------------

#[contracttype]
#[derive(Clone)]
pub struct AllowanceKey {
    pub from: Address,
    pub spender: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AllowanceValue {
    pub amount: i128,
    /// Last ledger sequence at which this allowance may still be spent.
    pub expiration_ledger: u32,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    // --- instance() ---
    Admin,
    // --- persistent() ---
    TotalSupply,
    Balance(Address),
    Allowance(AllowanceKey),
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[contractevent]
pub struct Minted {
    #[topic]
    pub to: Address,
    pub amount: i128,
}

#[contractevent]
pub struct Burned {
    #[topic]
    pub from: Address,
    pub amount: i128,
}

#[contractevent]
pub struct Transferred {
    #[topic]
    pub from: Address,
    #[topic]
    pub to: Address,
    pub amount: i128,
}

#[contractevent]
pub struct Approved {
    #[topic]
    pub from: Address,
    #[topic]
    pub spender: Address,
    pub amount: i128,
    pub expiration_ledger: u32,
}

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

#[contract]
pub struct TapRaceToken;

#[contractimpl]
impl TapRaceToken {
    /// Initialize the token and mint the initial supply to the admin.
    /// May only be called once.
    pub fn init(env: Env, admin: Address) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Admin) {
            return Err(Error::AlreadyInitialized);
        }

        admin.require_auth();

        env.storage().instance().set(&DataKey::Admin, &admin);
        set_balance(&env, &admin, INITIAL_SUPPLY);
        set_persistent(&env, &DataKey::TotalSupply, &INITIAL_SUPPLY);

        Minted {
            to: admin,
            amount: INITIAL_SUPPLY,
        }
        .publish(&env);

        Ok(())
    }

    /// An account's balance; zero for accounts never seen.
    pub fn balance(env: Env, id: Address) -> i128 {
        get_balance(&env, &id)
    }

    pub fn total_supply(env: Env) -> i128 {
        get_total_supply(&env)
    }

    pub fn supply_cap(_env: Env) -> i128 {
        MAX_SUPPLY
    }

    pub fn decimals(_env: Env) -> u32 {
        DECIMALS
    }

    pub fn name(env: Env) -> String {
        String::from_str(&env, "TapRace Token")
    }

    pub fn symbol(env: Env) -> String {
        String::from_str(&env, "TAPRACE")
    }

    /// Move `amount` from `from` to `to`. Fails without touching either
    /// balance when `from` cannot cover it.
    pub fn transfer(env: Env, from: Address, to: Address, amount: i128) -> Result<(), Error> {
        require_initialized(&env)?;
        from.require_auth();
        require_positive(amount)?;

        debit(&env, &from, amount)?;
        credit(&env, &to, amount)?;

        Transferred { from, to, amount }.publish(&env);

        Ok(())
    }

    /// Set the allowance from `from` to `spender` to exactly `amount`
    /// (replaces any previous value). A zero amount clears the entry.
    pub fn approve(
        env: Env,
        from: Address,
        spender: Address,
        amount: i128,
        expiration_ledger: u32,
    ) -> Result<(), Error> {
        require_initialized(&env)?;
        from.require_auth();

        if amount < 0 {
            return Err(Error::InvalidAmount);
        }

        let key = DataKey::Allowance(AllowanceKey {
            from: from.clone(),
            spender: spender.clone(),
        });

        if amount == 0 {
            env.storage().persistent().remove(&key);
        } else {
            if expiration_ledger < env.ledger().sequence() {
                return Err(Error::InvalidExpiration);
            }
            set_persistent(
                &env,
                &key,
                &AllowanceValue {
                    amount,
                    expiration_ledger,
                },
            );
        }

        Approved {
            from,
            spender,
            amount,
            expiration_ledger,
        }
        .publish(&env);

        Ok(())
    }

    /// Live allowance from `from` to `spender`; expired entries read as zero.
    pub fn allowance(env: Env, from: Address, spender: Address) -> i128 {
        get_allowance(&env, &from, &spender)
            .map(|a| a.amount)
            .unwrap_or(0)
    }

    /// Spend `from`'s balance under `spender`'s allowance. Allowance and
    /// balance are debited in the same invocation; any failure leaves both
    /// untouched.
    pub fn transfer_from(
        env: Env,
        spender: Address,
        from: Address,
        to: Address,
        amount: i128,
    ) -> Result<(), Error> {
        require_initialized(&env)?;
        spender.require_auth();
        require_positive(amount)?;

        consume_allowance(&env, &from, &spender, amount)?;
        debit(&env, &from, amount)?;
        credit(&env, &to, amount)?;

        Transferred { from, to, amount }.publish(&env);

        Ok(())
    }

    /// Mint `amount` to `to`. Admin only; the resulting supply must stay
    /// within `MAX_SUPPLY`.
    pub fn mint(env: Env, admin: Address, to: Address, amount: i128) -> Result<(), Error> {
        require_admin(&env, &admin)?;
        require_positive(amount)?;

        let supply = get_total_supply(&env)
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        if supply > MAX_SUPPLY {
            return Err(Error::SupplyCapExceeded);
        }

        credit(&env, &to, amount)?;
        set_persistent(&env, &DataKey::TotalSupply, &supply);

        Minted { to, amount }.publish(&env);

        Ok(())
    }

    /// Burn `amount` of `from`'s own balance, shrinking total supply.
    pub fn burn(env: Env, from: Address, amount: i128) -> Result<(), Error> {
        require_initialized(&env)?;
        from.require_auth();
        require_positive(amount)?;

        debit(&env, &from, amount)?;
        shrink_supply(&env, amount)?;

        Burned { from, amount }.publish(&env);

        Ok(())
    }

    /// Burn from `from`'s balance under `spender`'s allowance.
    pub fn burn_from(
        env: Env,
        spender: Address,
        from: Address,
        amount: i128,
    ) -> Result<(), Error> {
        require_initialized(&env)?;
        spender.require_auth();
        require_positive(amount)?;

        consume_allowance(&env, &from, &spender, amount)?;
        debit(&env, &from, amount)?;
        shrink_supply(&env, amount)?;

        Burned { from, amount }.publish(&env);

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn require_initialized(env: &Env) -> Result<(), Error> {
    if !env.storage().instance().has(&DataKey::Admin) {
        return Err(Error::NotInitialized);
    }
    Ok(())
}

/// Verify that `caller` is the stored admin and has signed the invocation.
fn require_admin(env: &Env, caller: &Address) -> Result<(), Error> {
    let admin: Address = env
        .storage()
        .instance()
        .get(&DataKey::Admin)
        .ok_or(Error::NotInitialized)?;
    caller.require_auth();
    if caller != &admin {
        return Err(Error::NotAuthorized);
    }
    Ok(())
}

fn require_positive(amount: i128) -> Result<(), Error> {
    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }
    Ok(())
}

fn get_balance(env: &Env, id: &Address) -> i128 {
    env.storage()
        .persistent()
        .get(&DataKey::Balance(id.clone()))
        .unwrap_or(0)
}

fn set_balance(env: &Env, id: &Address, amount: i128) {
    set_persistent(env, &DataKey::Balance(id.clone()), &amount);
}

fn debit(env: &Env, from: &Address, amount: i128) -> Result<(), Error> {
    let balance = get_balance(env, from);
    if balance < amount {
        return Err(Error::InsufficientBalance);
    }
    let new_balance = balance.checked_sub(amount).ok_or(Error::Overflow)?;
    set_balance(env, from, new_balance);
    Ok(())
}

fn credit(env: &Env, to: &Address, amount: i128) -> Result<(), Error> {
    let new_balance = get_balance(env, to)
        .checked_add(amount)
        .ok_or(Error::Overflow)?;
    set_balance(env, to, new_balance);
    Ok(())
}

fn get_total_supply(env: &Env) -> i128 {
    env.storage()
        .persistent()
        .get(&DataKey::TotalSupply)
        .unwrap_or(0)
}

fn shrink_supply(env: &Env, amount: i128) -> Result<(), Error> {
    let supply = get_total_supply(env)
        .checked_sub(amount)
        .ok_or(Error::Overflow)?;
    set_persistent(env, &DataKey::TotalSupply, &supply);
    Ok(())
}

fn get_allowance(env: &Env, from: &Address, spender: &Address) -> Option<AllowanceValue> {
    let key = DataKey::Allowance(AllowanceKey {
        from: from.clone(),
        spender: spender.clone(),
    });
    let value: AllowanceValue = env.storage().persistent().get(&key)?;
    if value.expiration_ledger < env.ledger().sequence() {
        return None;
    }
    Some(value)
}

fn consume_allowance(
    env: &Env,
    from: &Address,
    spender: &Address,
    amount: i128,
) -> Result<(), Error> {
    let value = get_allowance(env, from, spender).ok_or(Error::InsufficientAllowance)?;
    if value.amount < amount {
        return Err(Error::InsufficientAllowance);
    }

    let key = DataKey::Allowance(AllowanceKey {
        from: from.clone(),
        spender: spender.clone(),
    });
    let remaining = value.amount.checked_sub(amount).ok_or(Error::Overflow)?;
    if remaining == 0 {
        env.storage().persistent().remove(&key);
    } else {
        set_persistent(
            env,
            &key,
            &AllowanceValue {
                amount: remaining,
                expiration_ledger: value.expiration_ledger,
            },
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test;
