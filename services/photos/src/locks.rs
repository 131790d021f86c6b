//! Per-user serialization of mutating photo operations
//!
//! Two concurrent promotions for the same user could otherwise both read a
//! stale main-photo pointer and leave two photos flagged. Every mutating
//! lifecycle operation takes the owner's lock for its duration.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Registry of per-user async locks
#[derive(Debug, Clone, Default)]
pub struct UserLocks {
    entries: Arc<Mutex<HashMap<Uuid, Arc<Mutex<()>>>>>,
}

impl UserLocks {
    /// Create a new lock registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for a user, creating it on first use
    pub async fn acquire(&self, user_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut entries = self.entries.lock().await;
            entries
                .entry(user_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        lock.lock_owned().await
    }
}
