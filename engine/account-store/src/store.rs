//! Concurrent TTL store over customer account state

use std::time::Instant;

use dashmap::DashMap;
use tracing::debug;
use velocity_core::{AccountState, CustomerId};

use crate::config::StoreConfig;

#[derive(Debug, Clone)]
struct Entry {
    state: AccountState,
    /// `None` when the store's TTL is disabled
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

/// Keyed store mapping customer id to that customer's account state.
///
/// `get` hands out a clone of the snapshot and treats an expired entry
/// as a miss; `set` overwrites the snapshot and stamps a fresh expiry.
/// A `get` never refreshes the expiry clock, so an account that is
/// only ever read still ages out. Expired entries linger until the
/// next overwrite or [`purge_expired`](AccountStore::purge_expired)
/// sweep, but are never observable through `get`.
#[derive(Debug, Default)]
pub struct AccountStore {
    config: StoreConfig,
    entries: DashMap<CustomerId, Entry>,
}

impl AccountStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config, entries: DashMap::new() }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Current snapshot for `customer_id`, if present and not expired
    pub fn get(&self, customer_id: &str) -> Option<AccountState> {
        match self.entries.get(customer_id) {
            Some(entry) if !entry.is_expired(Instant::now()) => {
                debug!(customer_id, "account store hit");
                Some(entry.state.clone())
            }
            Some(_) => {
                debug!(customer_id, "account store entry expired");
                None
            }
            None => {
                debug!(customer_id, "account store miss");
                None
            }
        }
    }

    /// Persist a snapshot under its own customer id, stamping a fresh expiry
    pub fn set(&self, state: AccountState) {
        let expires_at = self.config.ttl().map(|ttl| Instant::now() + ttl);
        let customer_id = state.customer_id().to_string();
        self.entries.insert(customer_id, Entry { state, expires_at });
    }

    /// Drop every expired entry, returning how many were evicted.
    ///
    /// Counted inside the sweep itself: workers keep inserting while
    /// the janitor runs, so before/after length arithmetic would be
    /// meaningless here.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut evicted = 0;
        self.entries.retain(|_, entry| {
            let expired = entry.is_expired(now);
            if expired {
                evicted += 1;
            }
            !expired
        });
        if evicted > 0 {
            debug!(evicted, "purged expired account entries");
        }
        evicted
    }

    /// Number of entries currently held, expired stragglers included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
