//! TapRace Game Contract
//!
//! Runs timed tap-racing rounds: players pay a fixed token cost per tap,
//! every tap lands in the round pot, and the player with the most taps when
//! the clock runs out takes the whole pot.
//!
//! ## Round lifecycle
//! `start_round` (admin) opens a round with a fixed end time. `tap` is
//! accepted only while the round is Active and the clock has not expired —
//! expiry gates taps on its own, before anyone calls `end_round`.
//! `end_round` records the winner once the end time has passed, and
//! `finalize_round` pays the pot out exactly once. Status advances strictly
//! Active → Ended → Finalized; a round is never reopened, and at most one
//! round is Active at a time.
//!
//! ## Storage Strategy
//! - `instance()`: Admin, Token, Config, Paused, CurrentRoundId. Small,
//!   fixed-size contract config; all instance keys share one ledger entry.
//! - `persistent()`: per-round `Round` entries, per-(round, player) tap
//!   records, and per-round participant lists. Each is a separate ledger
//!   entry, TTL-bumped on every write.
#![no_std]
#![allow(unexpected_cfgs)]

use soroban_sdk::{
    contract, contracterror, contractevent, contractimpl, contracttype, token::TokenClient,
    Address, Env, Vec,
};
use taprace_shared::set_persistent;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Round length until the admin overrides it: 30 seconds of tapping.
pub const DEFAULT_ROUND_DURATION_SECS: u64 = 30;

/// Cost of one tap in token minor units (0.03 TAPRACE at 7 decimals).
pub const DEFAULT_TAP_COST: i128 = 300_000;

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
    ContractPaused = 4,
    AlreadyPaused = 5,
    NotPaused = 6,
    InvalidConfig = 7,
    RoundAlreadyActive = 8,
    RoundNotActive = 9,
    RoundExpired = 10,
    RoundNotYetEnded = 11,
    RoundNotEnded = 12,
    AlreadyFinalized = 13,
    RoundNotFound = 14,
    Overflow = 15,
}

// ---------------------------------------------------------------------------
// Storage Types
// ---------------------------------------------------------------------------

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RoundStatus {
    Active = 0,
    Ended = 1,
    Finalized = 2,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Round {
    pub id: u64,
    pub start_time: u64,
    pub end_time: u64,
    /// Tap price snapshotted at round start; a config change never reprices
    /// a running round.
    pub tap_cost: i128,
    pub total_pot: i128,
    pub status: RoundStatus,
    /// Unset until `end_round`; immutable afterwards.
    pub winner: Option<Address>,
}

/// Per-(round, player) tap record, created lazily on the first tap.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlayerRoundData {
    pub tap_count: u64,
    pub last_tap_time: u64,
    pub total_spent: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RankEntry {
    pub player: Address,
    pub tap_count: u64,
    pub last_tap_time: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GameConfig {
    pub round_duration_secs: u64,
    pub tap_cost: i128,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    // --- instance() ---
    Admin,
    Token,
    Config,
    Paused,
    /// Id of the most recently started round; 0 before the first round.
    CurrentRoundId,
    // --- persistent() ---
    Round(u64),
    PlayerData(u64, Address),
    /// Participants in first-tap order.
    RoundPlayers(u64),
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[contractevent]
pub struct Initialized {
    pub admin: Address,
    pub token: Address,
}

#[contractevent]
pub struct ConfigUpdated {
    pub round_duration_secs: u64,
    pub tap_cost: i128,
}

#[contractevent]
pub struct PauseChanged {
    pub paused: bool,
    pub admin: Address,
}

#[contractevent]
pub struct RoundStarted {
    #[topic]
    pub round_id: u64,
    pub start_time: u64,
    pub end_time: u64,
    pub tap_cost: i128,
}

#[contractevent]
pub struct TapRecorded {
    #[topic]
    pub round_id: u64,
    #[topic]
    pub player: Address,
    pub tap_count: u64,
    pub total_pot: i128,
}

#[contractevent]
pub struct RoundEnded {
    #[topic]
    pub round_id: u64,
    pub winner: Option<Address>,
    pub total_pot: i128,
}

#[contractevent]
pub struct RoundFinalized {
    #[topic]
    pub round_id: u64,
    pub winner: Option<Address>,
    pub payout: i128,
}

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

#[contract]
pub struct TapRace;

#[contractimpl]
impl TapRace {
    // -----------------------------------------------------------------------
    // init / admin
    // -----------------------------------------------------------------------

    /// Initialize with admin and the stake token address. May only be called
    /// once. Seeds the default round configuration.
    pub fn init(env: Env, admin: Address, token: Address) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Admin) {
            return Err(Error::AlreadyInitialized);
        }

        admin.require_auth();

        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::Token, &token);
        env.storage().instance().set(&DataKey::Paused, &false);
        env.storage().instance().set(&DataKey::CurrentRoundId, &0u64);

        let config = GameConfig {
            round_duration_secs: DEFAULT_ROUND_DURATION_SECS,
            tap_cost: DEFAULT_TAP_COST,
        };
        env.storage().instance().set(&DataKey::Config, &config);

        Initialized { admin, token }.publish(&env);

        Ok(())
    }

    /// Replace the round configuration. Admin only; a running round keeps
    /// the tap cost it started with.
    pub fn set_config(env: Env, admin: Address, config: GameConfig) -> Result<(), Error> {
        require_admin(&env, &admin)?;

        if config.round_duration_secs == 0 || config.tap_cost <= 0 {
            return Err(Error::InvalidConfig);
        }

        env.storage().instance().set(&DataKey::Config, &config);

        ConfigUpdated {
            round_duration_secs: config.round_duration_secs,
            tap_cost: config.tap_cost,
        }
        .publish(&env);

        Ok(())
    }

    /// Halt `start_round` and `tap`. Settlement of rounds already underway
    /// (`end_round`, `finalize_round`) stays available so a pause can never
    /// trap a pot.
    pub fn pause(env: Env, admin: Address) -> Result<(), Error> {
        require_admin(&env, &admin)?;
        if is_paused(&env) {
            return Err(Error::AlreadyPaused);
        }

        env.storage().instance().set(&DataKey::Paused, &true);
        PauseChanged {
            paused: true,
            admin,
        }
        .publish(&env);
        Ok(())
    }

    pub fn unpause(env: Env, admin: Address) -> Result<(), Error> {
        require_admin(&env, &admin)?;
        if !is_paused(&env) {
            return Err(Error::NotPaused);
        }

        env.storage().instance().set(&DataKey::Paused, &false);
        PauseChanged {
            paused: false,
            admin,
        }
        .publish(&env);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // start_round
    // -----------------------------------------------------------------------

    /// Open a new round and return its id. Admin only. Ids are assigned
    /// sequentially starting at 1.
    ///
    /// Fails with `RoundAlreadyActive` while the current round has Active
    /// status — including a round whose clock has expired but which nobody
    /// has ended yet.
    pub fn start_round(env: Env, admin: Address) -> Result<u64, Error> {
        require_admin(&env, &admin)?;
        require_not_paused(&env)?;

        let current_id = get_current_round_id(&env);
        if current_id > 0 {
            let round = get_round_record(&env, current_id)?;
            if round.status == RoundStatus::Active {
                return Err(Error::RoundAlreadyActive);
            }
        }

        let id = current_id.checked_add(1).ok_or(Error::Overflow)?;
        let config = get_config_record(&env)?;
        let now = env.ledger().timestamp();
        let end_time = now
            .checked_add(config.round_duration_secs)
            .ok_or(Error::Overflow)?;

        let round = Round {
            id,
            start_time: now,
            end_time,
            tap_cost: config.tap_cost,
            total_pot: 0,
            status: RoundStatus::Active,
            winner: None,
        };
        set_persistent(&env, &DataKey::Round(id), &round);
        set_persistent(&env, &DataKey::RoundPlayers(id), &Vec::<Address>::new(&env));
        env.storage().instance().set(&DataKey::CurrentRoundId, &id);

        RoundStarted {
            round_id: id,
            start_time: now,
            end_time,
            tap_cost: config.tap_cost,
        }
        .publish(&env);

        Ok(id)
    }

    // -----------------------------------------------------------------------
    // tap
    // -----------------------------------------------------------------------

    /// Record one tap for `player` in the current round, collecting the tap
    /// cost into the pot. Returns the player's new tap count.
    ///
    /// Status and time window are checked in the same invocation that
    /// commits the write, and the stake transfer is part of that invocation:
    /// the accounting update and the debit both land or neither does.
    pub fn tap(env: Env, player: Address) -> Result<u64, Error> {
        require_initialized(&env)?;
        require_not_paused(&env)?;

        player.require_auth();

        let id = get_current_round_id(&env);
        if id == 0 {
            return Err(Error::RoundNotActive);
        }
        let mut round = get_round_record(&env, id)?;
        if round.status != RoundStatus::Active {
            return Err(Error::RoundNotActive);
        }

        // A late end_round call does not extend the window.
        let now = env.ledger().timestamp();
        if now >= round.end_time {
            return Err(Error::RoundExpired);
        }

        let token = get_token(&env);
        let contract_address = env.current_contract_address();
        TokenClient::new(&env, &token).transfer(&player, &contract_address, &round.tap_cost);

        let data_key = DataKey::PlayerData(id, player.clone());
        let mut data = get_player_data(&env, id, &player);

        // First tap registers the player as a participant.
        if data.tap_count == 0 {
            let players_key = DataKey::RoundPlayers(id);
            let mut players: Vec<Address> = env
                .storage()
                .persistent()
                .get(&players_key)
                .unwrap_or(Vec::new(&env));
            players.push_back(player.clone());
            set_persistent(&env, &players_key, &players);
        }

        data.tap_count = data.tap_count.checked_add(1).ok_or(Error::Overflow)?;
        data.last_tap_time = now;
        data.total_spent = data
            .total_spent
            .checked_add(round.tap_cost)
            .ok_or(Error::Overflow)?;
        set_persistent(&env, &data_key, &data);

        round.total_pot = round
            .total_pot
            .checked_add(round.tap_cost)
            .ok_or(Error::Overflow)?;
        set_persistent(&env, &DataKey::Round(id), &round);

        TapRecorded {
            round_id: id,
            player,
            tap_count: data.tap_count,
            total_pot: round.total_pot,
        }
        .publish(&env);

        Ok(data.tap_count)
    }

    // -----------------------------------------------------------------------
    // end_round
    // -----------------------------------------------------------------------

    /// Close the current round once its end time has passed and record the
    /// winner. Callable by anyone; an off-chain scheduler is expected to
    /// crank this promptly after expiry, but lateness carries no penalty.
    ///
    /// The winner is the strictly highest tap count; ties go to the player
    /// whose final tap came earliest (first to reach the max). A round with
    /// no participants ends with the winner unset.
    pub fn end_round(env: Env) -> Result<(), Error> {
        require_initialized(&env)?;

        let id = get_current_round_id(&env);
        if id == 0 {
            return Err(Error::RoundNotActive);
        }
        let mut round = get_round_record(&env, id)?;
        if round.status != RoundStatus::Active {
            return Err(Error::RoundNotActive);
        }
        if env.ledger().timestamp() < round.end_time {
            return Err(Error::RoundNotYetEnded);
        }

        round.winner = pick_winner(&env, id);
        round.status = RoundStatus::Ended;
        set_persistent(&env, &DataKey::Round(id), &round);

        RoundEnded {
            round_id: id,
            winner: round.winner.clone(),
            total_pot: round.total_pot,
        }
        .publish(&env);

        Ok(())
    }

    // -----------------------------------------------------------------------
    // finalize_round
    // -----------------------------------------------------------------------

    /// Pay the recorded winner the full pot. Callable by anyone, effective
    /// exactly once per round: repeat calls fail with `AlreadyFinalized`
    /// rather than silently no-op, so callers can tell settled from
    /// in-flight.
    ///
    /// The status flips to Finalized BEFORE the outbound token transfer, so
    /// a trapped transfer can never lead to a double payout on retry.
    pub fn finalize_round(env: Env, round_id: u64) -> Result<(), Error> {
        require_initialized(&env)?;

        let mut round = get_round_record(&env, round_id)?;
        match round.status {
            RoundStatus::Active => return Err(Error::RoundNotEnded),
            RoundStatus::Finalized => return Err(Error::AlreadyFinalized),
            RoundStatus::Ended => {}
        }

        round.status = RoundStatus::Finalized;
        set_persistent(&env, &DataKey::Round(round_id), &round);

        let payout = round.total_pot;
        if let Some(winner) = round.winner.clone() {
            if payout > 0 {
                let token = get_token(&env);
                let contract_address = env.current_contract_address();
                TokenClient::new(&env, &token).transfer(&contract_address, &winner, &payout);
            }
        }

        RoundFinalized {
            round_id,
            winner: round.winner,
            payout,
        }
        .publish(&env);

        Ok(())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The most recently started round, whatever its status.
    pub fn get_current_round(env: Env) -> Result<Round, Error> {
        require_initialized(&env)?;
        let id = get_current_round_id(&env);
        if id == 0 {
            return Err(Error::RoundNotFound);
        }
        get_round_record(&env, id)
    }

    pub fn get_round(env: Env, round_id: u64) -> Result<Round, Error> {
        require_initialized(&env)?;
        get_round_record(&env, round_id)
    }

    /// A player's tap record for a round; zeros when the player never
    /// tapped.
    pub fn get_player_round_data(env: Env, round_id: u64, player: Address) -> PlayerRoundData {
        get_player_data(&env, round_id, &player)
    }

    /// Participants of a round in first-tap order; empty for unknown rounds.
    pub fn get_round_players(env: Env, round_id: u64) -> Vec<Address> {
        env.storage()
            .persistent()
            .get(&DataKey::RoundPlayers(round_id))
            .unwrap_or(Vec::new(&env))
    }

    /// Ranking of a round's players: tap count descending, ties broken by
    /// earliest last tap — the same rule `end_round` uses to pick the
    /// winner. Recomputed from the stored records on every call, never
    /// independently mutated.
    pub fn rank(env: Env, round_id: u64) -> Vec<RankEntry> {
        let players: Vec<Address> = env
            .storage()
            .persistent()
            .get(&DataKey::RoundPlayers(round_id))
            .unwrap_or(Vec::new(&env));

        let mut entries: Vec<RankEntry> = Vec::new(&env);
        for player in players.iter() {
            let data = get_player_data(&env, round_id, &player);
            let entry = RankEntry {
                player,
                tap_count: data.tap_count,
                last_tap_time: data.last_tap_time,
            };

            // Insertion sort; participant lists are small.
            let mut inserted = false;
            for i in 0..entries.len() {
                if ranks_before(&entry, &entries.get_unchecked(i)) {
                    entries.insert(i, entry.clone());
                    inserted = true;
                    break;
                }
            }
            if !inserted {
                entries.push_back(entry);
            }
        }

        entries
    }

    pub fn get_config(env: Env) -> Result<GameConfig, Error> {
        require_initialized(&env)?;
        get_config_record(&env)
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

fn require_not_paused(env: &Env) -> Result<(), Error> {
    if is_paused(env) {
        return Err(Error::ContractPaused);
    }
    Ok(())
}

fn is_paused(env: &Env) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::Paused)
        .unwrap_or(false)
}

fn get_token(env: &Env) -> Address {
    env.storage()
        .instance()
        .get(&DataKey::Token)
        .expect("TapRace: token not set")
}

fn get_current_round_id(env: &Env) -> u64 {
    env.storage()
        .instance()
        .get(&DataKey::CurrentRoundId)
        .unwrap_or(0)
}

fn get_config_record(env: &Env) -> Result<GameConfig, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .ok_or(Error::NotInitialized)
}

fn get_round_record(env: &Env, round_id: u64) -> Result<Round, Error> {
    env.storage()
        .persistent()
        .get(&DataKey::Round(round_id))
        .ok_or(Error::RoundNotFound)
}

fn get_player_data(env: &Env, round_id: u64, player: &Address) -> PlayerRoundData {
    env.storage()
        .persistent()
        .get(&DataKey::PlayerData(round_id, player.clone()))
        .unwrap_or(PlayerRoundData {
            tap_count: 0,
            last_tap_time: 0,
            total_spent: 0,
        })
}

/// Winner scan: strictly highest tap count; ties broken by the earliest
/// final tap. The first participant encountered keeps the slot on a full
/// tie, which is deterministic because the player list is insertion-ordered.
fn pick_winner(env: &Env, round_id: u64) -> Option<Address> {
    let players: Vec<Address> = env
        .storage()
        .persistent()
        .get(&DataKey::RoundPlayers(round_id))
        .unwrap_or(Vec::new(env));

    let mut winner: Option<Address> = None;
    let mut best_count: u64 = 0;
    let mut best_time: u64 = 0;

    for player in players.iter() {
        let data = get_player_data(env, round_id, &player);
        if data.tap_count == 0 {
            continue;
        }
        let beats = match winner {
            None => true,
            Some(_) => {
                data.tap_count > best_count
                    || (data.tap_count == best_count && data.last_tap_time < best_time)
            }
        };
        if beats {
            best_count = data.tap_count;
            best_time = data.last_tap_time;
            winner = Some(player);
        }
    }

    winner
}

fn ranks_before(a: &RankEntry, b: &RankEntry) -> bool {
    a.tap_count > b.tap_count
        || (a.tap_count == b.tap_count && a.last_tap_time < b.last_tap_time)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
