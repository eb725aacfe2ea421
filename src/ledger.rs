//! Usage ledger: render count and spend within a rolling 24 hour window.
//!
//! The window is checked lazily when stats are loaded, never by a timer.
//! Admission is decided only by [`is_admitted`]; [`time_until_reset`] is for display.

use crate::error::Result;
use crate::store::{KeyValueStore, StoreKey};
use crate::types::{Cost, ModelTier, UsageStats};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

/// Load persisted stats, starting a fresh window when they are missing,
/// malformed or older than the window. Any fresh record is persisted
/// immediately. Never fails: storage errors degrade to a fresh record.
pub fn load_or_init(store: &dyn KeyValueStore, now: DateTime<Utc>) -> UsageStats {
    let persisted = match store.get(StoreKey::UsageStats) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "could not read usage stats, starting fresh");
            None
        }
    };

    if let Some(stats) = persisted.as_deref().and_then(decode_stats) {
        if !stats.is_expired(now) {
            return stats;
        }
        debug!(last_reset = %stats.last_reset, "usage window expired, resetting");
    }

    let fresh = UsageStats::fresh(now);
    if let Err(e) = save(store, &fresh) {
        warn!(error = %e, "could not persist reset usage stats");
    }
    fresh
}

fn decode_stats(raw: &str) -> Option<UsageStats> {
    match serde_json::from_str::<UsageStats>(raw) {
        Ok(stats) if stats.is_well_formed() => Some(stats),
        Ok(_) => {
            warn!("persisted usage stats out of range, ignoring");
            None
        }
        Err(e) => {
            warn!(error = %e, "persisted usage stats malformed, ignoring");
            None
        }
    }
}

/// Persist stats under the usage key
pub fn save(store: &dyn KeyValueStore, stats: &UsageStats) -> Result<()> {
    let encoded = serde_json::to_string(stats)?;
    store.set(StoreKey::UsageStats, &encoded)
}

/// Pro is always admitted; free is admitted while under the daily limit
#[inline]
pub fn is_admitted(stats: &UsageStats, tier: ModelTier, daily_limit: u32) -> bool {
    match tier {
        ModelTier::Pro => true,
        ModelTier::Free => stats.render_count < daily_limit,
    }
}

/// Count one completed render and add its cost. The window start is unchanged.
pub fn record_usage(stats: UsageStats, cost: Cost) -> UsageStats {
    UsageStats {
        render_count: stats.render_count.saturating_add(1),
        total_cost: stats.total_cost + cost,
        last_reset: stats.last_reset,
    }
}

/// Time left in the current window, never negative
pub fn time_until_reset(stats: &UsageStats, now: DateTime<Utc>) -> Duration {
    let remaining = stats.window_end().signed_duration_since(now);
    remaining.max(Duration::zero())
}

/// Free renders left in the current window
#[inline]
pub fn remaining_free_renders(stats: &UsageStats, daily_limit: u32) -> u32 {
    daily_limit.saturating_sub(stats.render_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AtomError;
    use crate::store::{MemoryStore, MockKeyValueStore};
    use chrono::TimeZone;

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    fn stats(count: u32, cost: f64, last_reset: DateTime<Utc>) -> UsageStats {
        UsageStats {
            render_count: count,
            total_cost: Cost::new(cost),
            last_reset,
        }
    }

    #[test]
    fn test_admission() {
        let now = Utc::now();
        for count in 0..10 {
            let s = stats(count, 0.0, now);
            assert_eq!(is_admitted(&s, ModelTier::Free, 5), count < 5);
            assert!(is_admitted(&s, ModelTier::Pro, 5));
        }
    }

    #[test]
    fn test_upgrade_scenario() {
        let s = stats(5, 0.0, Utc::now());
        assert!(!is_admitted(&s, ModelTier::Free, 5));
        assert!(is_admitted(&s, ModelTier::Pro, 5));
        assert_eq!(s.render_count, 5);
    }

    #[test]
    fn test_record_usage() {
        let start = at(1_700_000_000_000);
        let s = record_usage(stats(2, 1.45, start), Cost::new(4.25));

        assert_eq!(s.render_count, 3);
        assert!((s.total_cost.value() - 5.7).abs() < 1e-9);
        assert_eq!(s.last_reset, start);
    }

    #[test]
    fn test_time_until_reset() {
        let start = at(1_700_000_000_000);
        let s = stats(0, 0.0, start);

        assert_eq!(time_until_reset(&s, start), Duration::hours(24));
        assert_eq!(time_until_reset(&s, start + Duration::hours(23)), Duration::hours(1));
        assert_eq!(time_until_reset(&s, start + Duration::hours(25)), Duration::zero());
    }

    #[test]
    fn test_remaining_free_renders() {
        let now = Utc::now();
        assert_eq!(remaining_free_renders(&stats(2, 0.0, now), 5), 3);
        assert_eq!(remaining_free_renders(&stats(7, 0.0, now), 5), 0);
    }

    #[test]
    fn test_load_or_init_keeps_current_window() {
        let now = at(1_700_000_000_000);
        let current = stats(3, 2.9, now - Duration::hours(2));
        let encoded = serde_json::to_string(&current).unwrap();

        let mut store = MockKeyValueStore::new();
        store
            .expect_get()
            .returning(move |_| Ok(Some(encoded.clone())));
        store.expect_set().never();

        assert_eq!(load_or_init(&store, now), current);
    }

    #[test]
    fn test_load_or_init_resets_expired_window() {
        let now = at(1_700_000_000_000);
        let old = stats(5, 12.5, now - Duration::hours(25));
        let encoded = serde_json::to_string(&old).unwrap();

        let mut store = MockKeyValueStore::new();
        store
            .expect_get()
            .returning(move |_| Ok(Some(encoded.clone())));
        store
            .expect_set()
            .withf(move |key, value| {
                *key == StoreKey::UsageStats
                    && serde_json::from_str::<UsageStats>(value).unwrap() == UsageStats::fresh(now)
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let loaded = load_or_init(&store, now);
        assert_eq!(loaded.render_count, 0);
        assert_eq!(loaded.total_cost, Cost::ZERO);
        assert_eq!(loaded.last_reset, now);
    }

    #[test]
    fn test_load_or_init_treats_malformed_as_absent() {
        let now = at(1_700_000_000_000);
        let malformed = [
            "not json",
            r#"{"renderCount":"three"}"#,
            r#"{"renderCount":1,"totalCost":-4,"lastReset":1}"#,
        ];
        for raw in malformed {
            let store = MemoryStore::new();
            store.set(StoreKey::UsageStats, raw).unwrap();

            assert_eq!(load_or_init(&store, now), UsageStats::fresh(now));
        }
    }

    #[test]
    fn test_load_or_init_survives_store_failures() {
        let now = at(1_700_000_000_000);
        let mut store = MockKeyValueStore::new();
        store
            .expect_get()
            .returning(|_| Err(AtomError::LockPoisoned));
        store
            .expect_set()
            .times(1)
            .returning(|_, _| Err(AtomError::LockPoisoned));

        assert_eq!(load_or_init(&store, now), UsageStats::fresh(now));
    }

    #[test]
    fn test_load_or_init_is_idempotent() {
        let store = MemoryStore::new();
        let first = load_or_init(&store, Utc::now());
        let second = load_or_init(&store, Utc::now());
        assert_eq!(first, second);

        save(&store, &record_usage(first, Cost::new(1.45))).unwrap();
        let third = load_or_init(&store, Utc::now());
        let fourth = load_or_init(&store, Utc::now());
        assert_eq!(third, fourth);
        assert_eq!(third.render_count, 1);
    }

    #[test]
    fn test_window_reset_from_twenty_five_hours_ago() {
        let store = MemoryStore::new();
        let now = Utc::now();
        save(&store, &stats(4, 8.5, now - Duration::hours(25))).unwrap();

        let loaded = load_or_init(&store, now);
        assert_eq!(loaded.render_count, 0);
        assert_eq!(loaded.total_cost, Cost::ZERO);
        assert_eq!(loaded, UsageStats::fresh(now));

        // The reset was persisted
        let raw = store.get(StoreKey::UsageStats).unwrap().unwrap();
        let persisted: UsageStats = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted.render_count, 0);
    }
}
