//! Game store — the narrow persistence contract.
//!
//! DESIGN
//! ======
//! Games are ephemeral documents with a retention window: `get` / `put`
//! (TTL refreshed on every write) / `delete`, keyed by game code. Engine
//! code only ever sees the `GameStore` trait; startup picks the backend
//! (networked cache when `REDIS_URL` is set, in-process map otherwise).
//! There are no multi-game transactions; callers serialize per game
//! code above this layer.

pub mod memory;
pub mod redis;

use std::time::Duration;

use async_trait::async_trait;

use crate::game::Game;

/// Default retention window: 24 hours.
const DEFAULT_GAME_TTL_SECS: u64 = 24 * 60 * 60;

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Retention window for stored games, overridable via `GAME_TTL_SECS`.
#[must_use]
pub fn game_ttl() -> Duration {
    Duration::from_secs(env_parse("GAME_TTL_SECS", DEFAULT_GAME_TTL_SECS))
}

/// Storage key for a game code. Codes are case-insensitive on the wire,
/// so the canonical key is uppercase.
pub(crate) fn storage_key(code: &str) -> String {
    format!("game:{}", code.to_ascii_uppercase())
}

// =============================================================================
// ERRORS
// =============================================================================

/// Infrastructure faults. These are never business outcomes; the engine
/// surfaces them as a generic internal error.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("cache error: {0}")]
    Cache(#[from] ::redis::RedisError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// =============================================================================
// CONTRACT
// =============================================================================

/// Keyed game persistence with a bounded retention window. Implementors
/// may silently lose games after the TTL; the engine treats absence as
/// `NotFound`.
#[async_trait]
pub trait GameStore: Send + Sync {
    /// Fetch a game by code. `Ok(None)` when absent or expired.
    async fn get(&self, code: &str) -> Result<Option<Game>, StoreError>;

    /// Write a game, resetting its retention window.
    async fn put(&self, game: &Game) -> Result<(), StoreError>;

    /// Remove a game. Returns whether anything was deleted.
    async fn delete(&self, code: &str) -> Result<bool, StoreError>;
}
