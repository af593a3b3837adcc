//! Store configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Expiration policy for stored account state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Idle TTL in seconds before an entry may be evicted (0 = never expire)
    pub ttl_secs: u64,

    /// Interval in seconds between janitor sweeps (0 = no sweeping)
    pub purge_interval_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,          // 5 minutes
            purge_interval_secs: 600, // 10 minutes
        }
    }
}

impl StoreConfig {
    /// TTL as a [`Duration`], or `None` when expiration is disabled
    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl_secs > 0).then(|| Duration::from_secs(self.ttl_secs))
    }

    /// Sweep interval as a [`Duration`], or `None` when sweeping is disabled
    pub fn purge_interval(&self) -> Option<Duration> {
        (self.purge_interval_secs > 0).then(|| Duration::from_secs(self.purge_interval_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_cache_policy() {
        let config = StoreConfig::default();
        assert_eq!(config.ttl(), Some(Duration::from_secs(300)));
        assert_eq!(config.purge_interval(), Some(Duration::from_secs(600)));
    }

    #[test]
    fn zero_disables() {
        let config = StoreConfig { ttl_secs: 0, purge_interval_secs: 0 };
        assert_eq!(config.ttl(), None);
        assert_eq!(config.purge_interval(), None);
    }
}
