use clp_types::{PoolConfig, PoolError, PoolState, PositionInfo, PositionKey, TickInfo};
use soroban_sdk::{contracttype, Env};

// ============================================================================
// SOROBAN RESOURCE LIMITS
// ============================================================================
// - Write entries per tx: 50 entries / 132 KB
// - Read entries per tx: 100 entries / 200 KB
//
// Each tick, bitmap word, bitmap summary word and position is its own
// persistent entry. Empty entries are removed rather than stored as zeros,
// which keeps the tick registry sparse.
//
// A swap writes one tick entry per crossing plus the instance entry, so the
// crossing count per swap is capped below the write limit.
// ============================================================================

/// Maximum number of tick crossings allowed per swap operation
pub const MAX_TICK_CROSSINGS_PER_SWAP: u32 = 40;

/// Storage keys for the pool contract
#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    /// Pool configuration (Instance storage)
    Config,
    /// Current pool state (Instance storage)
    State,
    /// Set while a state-changing call is running (Instance storage)
    Locked,
    /// Next position id to hand out (Instance storage)
    NextPositionId,
    /// Tick data: tick_index -> TickInfo (Persistent storage)
    Tick(i32),
    /// Tick bitmap: word_position -> u128 bitmap (Persistent storage)
    TickBitmap(i32),
    /// Non-empty bitmap words: summary_position -> u128 bitmap (Persistent storage)
    TickBitmapSummary(i32),
    /// Position data: PositionKey -> PositionInfo (Persistent storage)
    Position(PositionKey),
    /// PositionKey -> position id (Persistent storage)
    PositionId(PositionKey),
    /// Position id -> PositionKey (Persistent storage)
    PositionById(u64),
}

// TTL constants
const INSTANCE_TTL_THRESHOLD: u32 = 17280; // ~1 day
const INSTANCE_TTL_EXTEND: u32 = 518400; // ~30 days
const PERSISTENT_TTL_THRESHOLD: u32 = 17280;
const PERSISTENT_TTL_EXTEND: u32 = 518400;

/// Extend instance storage TTL
pub fn extend_instance_ttl(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_TTL_THRESHOLD, INSTANCE_TTL_EXTEND);
}

/// Extend persistent storage TTL for a key
pub fn extend_persistent_ttl(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_TTL_THRESHOLD, PERSISTENT_TTL_EXTEND);
}

// === Config ===

pub fn is_initialized(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Config)
}

pub fn get_config(env: &Env) -> Result<PoolConfig, PoolError> {
    let config = env
        .storage()
        .instance()
        .get(&DataKey::Config)
        .ok_or(PoolError::NotInitialized)?;
    extend_instance_ttl(env);
    Ok(config)
}

pub fn set_config(env: &Env, config: &PoolConfig) {
    env.storage().instance().set(&DataKey::Config, config);
    extend_instance_ttl(env);
}

// === State ===

pub fn get_state(env: &Env) -> Result<PoolState, PoolError> {
    env.storage()
        .instance()
        .get(&DataKey::State)
        .ok_or(PoolError::NotInitialized)
}

pub fn set_state(env: &Env, state: &PoolState) {
    env.storage().instance().set(&DataKey::State, state);
    extend_instance_ttl(env);
}

// === Call lock ===

pub fn is_locked(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Locked)
}

pub fn set_locked(env: &Env, locked: bool) {
    if locked {
        env.storage().instance().set(&DataKey::Locked, &true);
    } else {
        env.storage().instance().remove(&DataKey::Locked);
    }
}

// === Tick ===

pub fn get_tick(env: &Env, tick: i32) -> TickInfo {
    let key = DataKey::Tick(tick);
    env.storage().persistent().get(&key).unwrap_or_default()
}

pub fn set_tick(env: &Env, tick: i32, info: &TickInfo) {
    let key = DataKey::Tick(tick);
    if !info.is_initialized() {
        env.storage().persistent().remove(&key);
    } else {
        env.storage().persistent().set(&key, info);
        extend_persistent_ttl(env, &key);
    }
}

#[cfg(test)]
pub fn has_tick(env: &Env, tick: i32) -> bool {
    env.storage().persistent().has(&DataKey::Tick(tick))
}

// === Tick Bitmap ===

pub fn get_tick_bitmap_word(env: &Env, word_pos: i32) -> u128 {
    let key = DataKey::TickBitmap(word_pos);
    env.storage().persistent().get(&key).unwrap_or(0u128)
}

pub fn set_tick_bitmap_word(env: &Env, word_pos: i32, bitmap: u128) {
    set_bitmap(env, DataKey::TickBitmap(word_pos), bitmap);
}

pub fn get_tick_bitmap_summary(env: &Env, summary_pos: i32) -> u128 {
    let key = DataKey::TickBitmapSummary(summary_pos);
    env.storage().persistent().get(&key).unwrap_or(0u128)
}

pub fn set_tick_bitmap_summary(env: &Env, summary_pos: i32, bitmap: u128) {
    set_bitmap(env, DataKey::TickBitmapSummary(summary_pos), bitmap);
}

fn set_bitmap(env: &Env, key: DataKey, bitmap: u128) {
    if bitmap == 0 {
        env.storage().persistent().remove(&key);
    } else {
        env.storage().persistent().set(&key, &bitmap);
        extend_persistent_ttl(env, &key);
    }
}

// === Position ===

pub fn get_position(env: &Env, key: &PositionKey) -> PositionInfo {
    let data_key = DataKey::Position(key.clone());
    env.storage()
        .persistent()
        .get(&data_key)
        .unwrap_or_default()
}

pub fn set_position(env: &Env, key: &PositionKey, info: &PositionInfo) {
    let data_key = DataKey::Position(key.clone());
    if info.is_empty() {
        env.storage().persistent().remove(&data_key);
    } else {
        env.storage().persistent().set(&data_key, info);
        extend_persistent_ttl(env, &data_key);
    }
}

// === Position ids ===

/// Id of the position at `key`, assigning the next free id on first use.
/// Ids stay attached to their key for the life of the pool.
pub fn position_id_or_assign(env: &Env, key: &PositionKey) -> u64 {
    let id_key = DataKey::PositionId(key.clone());
    if let Some(id) = env.storage().persistent().get::<_, u64>(&id_key) {
        extend_persistent_ttl(env, &id_key);
        return id;
    }

    let id: u64 = env
        .storage()
        .instance()
        .get(&DataKey::NextPositionId)
        .unwrap_or(1);
    env.storage()
        .instance()
        .set(&DataKey::NextPositionId, &(id + 1));

    let by_id_key = DataKey::PositionById(id);
    env.storage().persistent().set(&id_key, &id);
    env.storage().persistent().set(&by_id_key, key);
    extend_persistent_ttl(env, &id_key);
    extend_persistent_ttl(env, &by_id_key);

    id
}

pub fn get_position_key(env: &Env, id: u64) -> Option<PositionKey> {
    env.storage().persistent().get(&DataKey::PositionById(id))
}
