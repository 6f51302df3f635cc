use soroban_sdk::{contracttype, Env, Vec};

use crate::{Config, ContractError, Stream};

/// Remaining TTL (in ledgers) below which an entry is extended.
pub const TTL_THRESHOLD: u32 = 17280;
/// TTL (in ledgers) an entry is extended to.
pub const TTL_EXTEND_TO: u32 = 120960;
/// Most streams a single `reconcile` call reads, keeping it within the
/// per-invocation budget however long the stream history grows.
pub const MAX_RECONCILE_PAGE: u32 = 50;

/// Namespace for all contract storage keys.
#[contracttype]
pub enum DataKey {
    Config,       // Instance storage for global settings (token).
    NextStreamId, // Instance storage for the auto-incrementing ID counter.
    Stream(u64),  // Persistent storage for individual stream data (O(1) lookup).
}

pub fn has_config(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Config)
}

pub fn set_config(env: &Env, config: &Config) {
    env.storage().instance().set(&DataKey::Config, config);
}

pub fn get_config(env: &Env) -> Result<Config, ContractError> {
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .ok_or(ContractError::NotInitialised)
}

pub fn extend_instance_ttl(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);
}

pub fn get_stream_count(env: &Env) -> u64 {
    env.storage()
        .instance()
        .get(&DataKey::NextStreamId)
        .unwrap_or(0u64)
}

pub fn set_stream_count(env: &Env, count: u64) {
    env.storage().instance().set(&DataKey::NextStreamId, &count);
}

/// Reserves the next sequential stream id.
pub fn next_stream_id(env: &Env) -> u64 {
    let stream_id = get_stream_count(env);
    set_stream_count(env, stream_id + 1);
    stream_id
}

pub fn load_stream(env: &Env, stream_id: u64) -> Result<Stream, ContractError> {
    env.storage()
        .persistent()
        .get(&DataKey::Stream(stream_id))
        .ok_or(ContractError::StreamNotFound)
}

pub fn save_stream(env: &Env, stream: &Stream) {
    let key = DataKey::Stream(stream.stream_id);
    env.storage().persistent().set(&key, stream);
    env.storage()
        .persistent()
        .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
}

/// Streams with ids in `[from_id, from_id + limit)`, in id order, together
/// with the id just past the last one read. The returned id never exceeds
/// the stream count.
pub fn load_range(env: &Env, from_id: u64, limit: u32) -> (Vec<Stream>, u64) {
    let count = get_stream_count(env);
    let start = from_id.min(count);
    let end = start.saturating_add(u64::from(limit)).min(count);

    let mut streams = Vec::new(env);
    for stream_id in start..end {
        if let Some(stream) = env
            .storage()
            .persistent()
            .get::<DataKey, Stream>(&DataKey::Stream(stream_id))
        {
            streams.push_back(stream);
        }
    }
    (streams, end)
}

pub fn save_all(env: &Env, streams: &Vec<Stream>) {
    for stream in streams.iter() {
        save_stream(env, &stream);
    }
}
