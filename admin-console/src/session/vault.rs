//! Server-side home of every signed-in browser's credential.
//!
//! The cookie-keyed session record only carries an opaque slot id. Tokens
//! and role live here, so every read and write hits the shared map directly
//! and a per-request copy of the session record can never bring a cleared
//! credential back.

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::store::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, ROLE_KEY};

#[derive(Debug, Clone)]
struct Slot {
    values: HashMap<&'static str, String>,
    touched: Instant,
}

/// Credential slots keyed by slot id, dropped after `idle` without use.
#[derive(Clone)]
pub struct CredentialVault {
    slots: Arc<DashMap<String, Slot>>,
    idle: Duration,
}

impl CredentialVault {
    pub fn new(idle: Duration) -> Self {
        Self {
            slots: Arc::new(DashMap::new()),
            idle,
        }
    }

    /// Field values of a live slot. Reading refreshes the idle timer.
    pub fn get(&self, slot: &str) -> Option<HashMap<&'static str, String>> {
        let now = Instant::now();
        let values = {
            let mut entry = self.slots.get_mut(slot)?;
            if now.duration_since(entry.touched) >= self.idle {
                None
            } else {
                entry.touched = now;
                Some(entry.values.clone())
            }
        };
        if values.is_none() {
            self.slots
                .remove_if(slot, |_, entry| now.duration_since(entry.touched) >= self.idle);
        }
        values
    }

    /// Insert `fields` into the slot, creating it when missing.
    pub fn upsert(&self, slot: &str, fields: &[(&'static str, &str)]) {
        let now = Instant::now();
        let mut entry = self.slots.entry(slot.to_string()).or_insert_with(|| Slot {
            values: HashMap::new(),
            touched: now,
        });
        for (key, value) in fields {
            entry.values.insert(*key, value.to_string());
        }
        entry.touched = now;
    }

    /// Set `key` on an existing slot only. Returns false when the slot is gone.
    pub fn update(&self, slot: &str, key: &'static str, value: &str) -> bool {
        match self.slots.get_mut(slot) {
            Some(mut entry) => {
                entry.values.insert(key, value.to_string());
                entry.touched = Instant::now();
                true
            }
            None => false,
        }
    }

    /// Swap in renewed tokens, but only while the slot still holds
    /// `rejected_access`. The check and the write happen under one shard lock.
    pub fn replace_access(
        &self,
        slot: &str,
        rejected_access: &str,
        access: &str,
        refresh: Option<&str>,
    ) -> bool {
        let Some(mut entry) = self.slots.get_mut(slot) else {
            return false;
        };
        if entry.values.get(ACCESS_TOKEN_KEY).map(String::as_str) != Some(rejected_access) {
            return false;
        }

        entry.values.insert(ACCESS_TOKEN_KEY, access.to_string());
        if let Some(refresh) = refresh {
            entry.values.insert(REFRESH_TOKEN_KEY, refresh.to_string());
        }
        entry.touched = Instant::now();
        true
    }

    pub fn remove(&self, slot: &str) {
        self.slots.remove(slot);
    }

    /// Drop every slot idle for longer than the configured timeout.
    pub fn purge_idle(&self) -> usize {
        let before = self.slots.len();
        let idle = self.idle;
        self.slots.retain(|_, entry| entry.touched.elapsed() < idle);
        before.saturating_sub(self.slots.len())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Sweep idle slots every `period` for the life of the process.
pub fn spawn_idle_sweeper(vault: CredentialVault, period: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let purged = vault.purge_idle();
            if purged > 0 {
                tracing::debug!(purged, "Dropped idle credential slots");
            }
        }
    })
}
