//! Redis-protocol game store — the networked cache backend.
//!
//! DESIGN
//! ======
//! One JSON document per game under `game:{CODE}`, written with `SET ...
//! EX ttl` so the cache itself enforces the retention window. The
//! connection manager reconnects transparently; individual command
//! failures surface as `StoreError::Cache` and reach the caller as a
//! generic internal error.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use crate::game::Game;
use crate::store::{GameStore, StoreError, storage_key};

pub struct RedisStore {
    conn: ConnectionManager,
    ttl: Duration,
}

impl RedisStore {
    /// Connect to the cache at `url`.
    ///
    /// # Errors
    ///
    /// Returns a cache error if the URL is malformed or the initial
    /// connection fails.
    pub async fn connect(url: &str, ttl: Duration) -> Result<Self, StoreError> {
        let client = redis::Client::open(url).map_err(StoreError::Cache)?;
        let conn = client.get_connection_manager().await.map_err(StoreError::Cache)?;
        Ok(Self { conn, ttl })
    }
}

#[async_trait]
impl GameStore for RedisStore {
    async fn get(&self, code: &str) -> Result<Option<Game>, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(storage_key(code)).await?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    async fn put(&self, game: &Game) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let payload = serde_json::to_string(game)?;
        let () = conn.set_ex(storage_key(&game.code), payload, self.ttl.as_secs()).await?;
        Ok(())
    }

    async fn delete(&self, code: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let removed: u64 = conn.del(storage_key(code)).await?;
        Ok(removed > 0)
    }
}
