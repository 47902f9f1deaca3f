//! Per-page mutual exclusion.
//!
//! Serializes the load → check → mutate → commit sequence of writers on the
//! same slug. Writers on different slugs never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OwnedMutexGuard;

#[derive(Default)]
pub struct PageLocks {
    slots: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl PageLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `slug`. Released when the guard drops.
    pub async fn lock(&self, slug: &str) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            // Drop slots nobody holds or waits on.
            slots.retain(|key, m| key == slug || Arc::strong_count(m) > 1);
            Arc::clone(slots.entry(slug.to_string()).or_default())
        };
        slot.lock_owned().await
    }

    /// Number of slugs currently tracked.
    pub fn tracked(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
