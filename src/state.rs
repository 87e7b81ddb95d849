//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the game store behind the `GameStore` trait and a lock table
//! keyed by game code. Every mutating operation is a read-modify-write
//! cycle against the store, so two callers touching the same game must
//! serialize; callers on different games never contend.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::store::GameStore;

// =============================================================================
// SESSION LOCKS
// =============================================================================

/// Per-game async mutexes, created on first use.
///
/// The table itself is only held long enough to clone the game's lock
/// Arc; the per-game lock is then awaited without the table guard, so a
/// long-held game lock never blocks unrelated games.
#[derive(Clone, Default)]
pub struct SessionLocks {
    inner: Arc<RwLock<HashMap<String, Arc<Mutex<()>>>>>,
}

impl SessionLocks {
    /// Acquire the lock for a game code, creating it if needed.
    pub async fn acquire(&self, code: &str) -> OwnedMutexGuard<()> {
        let key = code.to_ascii_uppercase();
        let existing = self.inner.read().await.get(&key).cloned();
        let lock = match existing {
            Some(lock) => lock,
            None => self.inner.write().await.entry(key).or_default().clone(),
        };
        lock.lock_owned().await
    }

    /// Drop the lock entry for a deleted or missing game. Late holders
    /// of the old Arc keep working; they will just find the game gone.
    pub async fn remove(&self, code: &str) {
        self.inner.write().await.remove(&code.to_ascii_uppercase());
    }

    #[cfg(test)]
    pub(crate) async fn contains(&self, code: &str) -> bool {
        self.inner.read().await.contains_key(&code.to_ascii_uppercase())
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state. Clone is required by Axum; all inner
/// fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn GameStore>,
    pub locks: SessionLocks,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn GameStore>) -> Self {
        Self { store, locks: SessionLocks::default() }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
