//! In-process game store — local fallback backend.
//!
//! DESIGN
//! ======
//! A guarded map with lazy TTL enforcement: entries record an expiry
//! instant and are dropped on the next access past it. No sweeper task;
//! games are few and small, and an expired entry that is never touched
//! again costs one map slot until the process restarts.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::game::Game;
use crate::store::{GameStore, StoreError, storage_key};

struct Entry {
    game: Game,
    expires_at: Instant,
}

pub struct MemoryStore {
    inner: RwLock<HashMap<String, Entry>>,
    ttl: Duration,
}

impl MemoryStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self { inner: RwLock::new(HashMap::new()), ttl }
    }

    /// Internal: fetch with an explicit clock (for testing expiry).
    async fn get_at(&self, code: &str, now: Instant) -> Option<Game> {
        let key = storage_key(code);
        let mut map = self.inner.write().await;
        match map.get(&key) {
            Some(entry) if now < entry.expires_at => Some(entry.game.clone()),
            Some(_) => {
                map.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Internal: write with an explicit clock (for testing expiry).
    async fn put_at(&self, game: &Game, now: Instant) {
        let key = storage_key(&game.code);
        let entry = Entry { game: game.clone(), expires_at: now + self.ttl };
        self.inner.write().await.insert(key, entry);
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn get(&self, code: &str) -> Result<Option<Game>, StoreError> {
        Ok(self.get_at(code, Instant::now()).await)
    }

    async fn put(&self, game: &Game) -> Result<(), StoreError> {
        self.put_at(game, Instant::now()).await;
        Ok(())
    }

    async fn delete(&self, code: &str) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.remove(&storage_key(code)).is_some())
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
