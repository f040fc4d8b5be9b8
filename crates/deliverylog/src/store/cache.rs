//! Time-bounded cache of the parsed delivery log.

use std::time::{Duration, Instant};

use crate::record::DeliveryRecord;

/// Parsed log contents plus the instant they were read.
#[derive(Debug, Clone)]
pub struct LogCache {
    records: Vec<DeliveryRecord>,
    loaded_at: Instant,
}

impl LogCache {
    /// Wrap records read at `loaded_at`.
    #[must_use]
    pub fn new(records: Vec<DeliveryRecord>, loaded_at: Instant) -> Self {
        Self { records, loaded_at }
    }

    /// Whether the contents may still be served at `now`.
    ///
    /// A zero `ttl` disables caching.
    #[must_use]
    pub fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.loaded_at) < ttl
    }

    /// Cached records in log order.
    #[must_use]
    pub fn records(&self) -> &[DeliveryRecord] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_within_ttl() {
        let loaded = Instant::now();
        let cache = LogCache::new(Vec::new(), loaded);
        assert!(cache.is_fresh(loaded + Duration::from_secs(59), Duration::from_secs(60)));
    }

    #[test]
    fn test_stale_at_ttl() {
        let loaded = Instant::now();
        let cache = LogCache::new(Vec::new(), loaded);
        assert!(!cache.is_fresh(loaded + Duration::from_secs(60), Duration::from_secs(60)));
    }

    #[test]
    fn test_zero_ttl_never_fresh() {
        let loaded = Instant::now();
        let cache = LogCache::new(Vec::new(), loaded);
        assert!(!cache.is_fresh(loaded, Duration::ZERO));
    }
}
