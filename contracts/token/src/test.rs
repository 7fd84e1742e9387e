//! Unit tests for the TapRace token.
use super::*;
use soroban_sdk::testutils::{Address as _, Ledger as _};
use soroban_sdk::{Address, Env};

fn setup(env: &Env) -> (TapRaceTokenClient<'_>, Address) {
    let admin = Address::generate(env);
    let contract_id = env.register(TapRaceToken, ());
    let client = TapRaceTokenClient::new(env, &contract_id);
    env.mock_all_auths();
    client.init(&admin);
    (client, admin)
}

#[test]
fn test_init_mints_initial_supply_to_admin() {
    let env = Env::default();
    let (client, admin) = setup(&env);

    assert_eq!(client.balance(&admin), INITIAL_SUPPLY);
    assert_eq!(client.total_supply(), INITIAL_SUPPLY);
}

#[test]
fn test_init_rejects_reinit() {
    let env = Env::default();
    let (client, admin) = setup(&env);
    env.mock_all_auths();

    let result = client.try_init(&admin);
    assert!(result.is_err());
}

#[test]
fn test_metadata() {
    let env = Env::default();
    let (client, _) = setup(&env);

    assert_eq!(client.decimals(), 7);
    assert_eq!(client.name(), String::from_str(&env, "TapRace Token"));
    assert_eq!(client.symbol(), String::from_str(&env, "TAPRACE"));
    assert_eq!(client.supply_cap(), MAX_SUPPLY);
}

#[test]
fn test_transfer_moves_balance() {
    let env = Env::default();
    let (client, admin) = setup(&env);
    env.mock_all_auths();

    let recipient = Address::generate(&env);
    client.transfer(&admin, &recipient, &1_000i128);

    assert_eq!(client.balance(&recipient), 1_000);
    assert_eq!(client.balance(&admin), INITIAL_SUPPLY - 1_000);
    // Transfers never change supply.
    assert_eq!(client.total_supply(), INITIAL_SUPPLY);
}

#[test]
fn test_transfer_insufficient_balance_leaves_balances_unchanged() {
    let env = Env::default();
    let (client, admin) = setup(&env);
    env.mock_all_auths();

    let poor = Address::generate(&env);
    let recipient = Address::generate(&env);
    client.transfer(&admin, &poor, &100i128);

    let result = client.try_transfer(&poor, &recipient, &101i128);
    assert_eq!(result, Err(Ok(Error::InsufficientBalance)));

    assert_eq!(client.balance(&poor), 100);
    assert_eq!(client.balance(&recipient), 0);
}

#[test]
fn test_transfer_non_positive_amount_rejected() {
    let env = Env::default();
    let (client, admin) = setup(&env);
    env.mock_all_auths();

    let recipient = Address::generate(&env);
    assert_eq!(
        client.try_transfer(&admin, &recipient, &0i128),
        Err(Ok(Error::InvalidAmount))
    );
    assert_eq!(
        client.try_transfer(&admin, &recipient, &-5i128),
        Err(Ok(Error::InvalidAmount))
    );
}

#[test]
fn test_approve_sets_and_replaces_allowance() {
    let env = Env::default();
    let (client, admin) = setup(&env);
    env.mock_all_auths();

    let spender = Address::generate(&env);
    client.approve(&admin, &spender, &500i128, &1000u32);
    assert_eq!(client.allowance(&admin, &spender), 500);

    // Replaces, not additive.
    client.approve(&admin, &spender, &200i128, &1000u32);
    assert_eq!(client.allowance(&admin, &spender), 200);
}

#[test]
fn test_approve_zero_clears_allowance() {
    let env = Env::default();
    let (client, admin) = setup(&env);
    env.mock_all_auths();

    let spender = Address::generate(&env);
    client.approve(&admin, &spender, &500i128, &1000u32);
    client.approve(&admin, &spender, &0i128, &0u32);
    assert_eq!(client.allowance(&admin, &spender), 0);
}

#[test]
fn test_approve_negative_rejected() {
    let env = Env::default();
    let (client, admin) = setup(&env);
    env.mock_all_auths();

    let spender = Address::generate(&env);
    let result = client.try_approve(&admin, &spender, &-1i128, &1000u32);
    assert_eq!(result, Err(Ok(Error::InvalidAmount)));
}

#[test]
fn test_approve_past_expiration_rejected() {
    let env = Env::default();
    let (client, admin) = setup(&env);
    env.mock_all_auths();

    env.ledger().with_mut(|li| {
        li.sequence_number = 10;
    });

    let spender = Address::generate(&env);
    let result = client.try_approve(&admin, &spender, &500i128, &5u32);
    assert_eq!(result, Err(Ok(Error::InvalidExpiration)));
}

#[test]
fn test_transfer_from_spends_allowance() {
    let env = Env::default();
    let (client, admin) = setup(&env);
    env.mock_all_auths();

    let spender = Address::generate(&env);
    let recipient = Address::generate(&env);
    client.approve(&admin, &spender, &500i128, &1000u32);
    client.transfer_from(&spender, &admin, &recipient, &300i128);

    assert_eq!(client.balance(&recipient), 300);
    assert_eq!(client.balance(&admin), INITIAL_SUPPLY - 300);
    assert_eq!(client.allowance(&admin, &spender), 200);
}

#[test]
fn test_transfer_from_exceeding_allowance_rejected() {
    let env = Env::default();
    let (client, admin) = setup(&env);
    env.mock_all_auths();

    let spender = Address::generate(&env);
    let recipient = Address::generate(&env);
    client.approve(&admin, &spender, &100i128, &1000u32);

    let result = client.try_transfer_from(&spender, &admin, &recipient, &101i128);
    assert_eq!(result, Err(Ok(Error::InsufficientAllowance)));
    assert_eq!(client.allowance(&admin, &spender), 100);
}

#[test]
fn test_transfer_from_exceeding_balance_rejected() {
    let env = Env::default();
    let (client, admin) = setup(&env);
    env.mock_all_auths();

    let owner = Address::generate(&env);
    let spender = Address::generate(&env);
    let recipient = Address::generate(&env);
    client.transfer(&admin, &owner, &50i128);
    // Allowance larger than the owner's balance.
    client.approve(&owner, &spender, &500i128, &1000u32);

    let result = client.try_transfer_from(&spender, &owner, &recipient, &100i128);
    assert_eq!(result, Err(Ok(Error::InsufficientBalance)));
    assert_eq!(client.balance(&owner), 50);
}

#[test]
fn test_expired_allowance_reads_zero_and_cannot_be_spent() {
    let env = Env::default();
    let (client, admin) = setup(&env);
    env.mock_all_auths();

    let spender = Address::generate(&env);
    let recipient = Address::generate(&env);
    client.approve(&admin, &spender, &500i128, &5u32);

    env.ledger().with_mut(|li| {
        li.sequence_number = 6;
    });

    assert_eq!(client.allowance(&admin, &spender), 0);
    let result = client.try_transfer_from(&spender, &admin, &recipient, &100i128);
    assert_eq!(result, Err(Ok(Error::InsufficientAllowance)));
}

#[test]
fn test_mint_within_cap() {
    let env = Env::default();
    let (client, admin) = setup(&env);
    env.mock_all_auths();

    let recipient = Address::generate(&env);
    client.mint(&admin, &recipient, &1_000i128);

    assert_eq!(client.balance(&recipient), 1_000);
    assert_eq!(client.total_supply(), INITIAL_SUPPLY + 1_000);
}

#[test]
fn test_mint_beyond_cap_rejected() {
    let env = Env::default();
    let (client, admin) = setup(&env);
    env.mock_all_auths();

    let recipient = Address::generate(&env);
    let headroom = MAX_SUPPLY - INITIAL_SUPPLY;
    client.mint(&admin, &recipient, &headroom);
    assert_eq!(client.total_supply(), MAX_SUPPLY);

    let result = client.try_mint(&admin, &recipient, &1i128);
    assert_eq!(result, Err(Ok(Error::SupplyCapExceeded)));
}

#[test]
fn test_mint_by_non_admin_rejected() {
    let env = Env::default();
    let (client, _) = setup(&env);
    env.mock_all_auths();

    let outsider = Address::generate(&env);
    let result = client.try_mint(&outsider, &outsider, &1_000i128);
    assert_eq!(result, Err(Ok(Error::NotAuthorized)));
}

#[test]
fn test_burn_shrinks_balance_and_supply() {
    let env = Env::default();
    let (client, admin) = setup(&env);
    env.mock_all_auths();

    client.burn(&admin, &1_000i128);

    assert_eq!(client.balance(&admin), INITIAL_SUPPLY - 1_000);
    assert_eq!(client.total_supply(), INITIAL_SUPPLY - 1_000);
}

#[test]
fn test_burn_insufficient_balance_rejected() {
    let env = Env::default();
    let (client, admin) = setup(&env);
    env.mock_all_auths();

    let holder = Address::generate(&env);
    client.transfer(&admin, &holder, &100i128);

    let result = client.try_burn(&holder, &101i128);
    assert_eq!(result, Err(Ok(Error::InsufficientBalance)));
    assert_eq!(client.balance(&holder), 100);
}

#[test]
fn test_burn_from_respects_allowance() {
    let env = Env::default();
    let (client, admin) = setup(&env);
    env.mock_all_auths();

    let spender = Address::generate(&env);
    client.approve(&admin, &spender, &300i128, &1000u32);
    client.burn_from(&spender, &admin, &200i128);

    assert_eq!(client.balance(&admin), INITIAL_SUPPLY - 200);
    assert_eq!(client.total_supply(), INITIAL_SUPPLY - 200);
    assert_eq!(client.allowance(&admin, &spender), 100);

    let result = client.try_burn_from(&spender, &admin, &200i128);
    assert_eq!(result, Err(Ok(Error::InsufficientAllowance)));
}
