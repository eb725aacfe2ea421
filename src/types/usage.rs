use super::cost::Cost;
use crate::constants::USAGE_WINDOW;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Render count and spend within the current accounting window.
///
/// Persisted as `{"renderCount": .., "totalCost": .., "lastReset": <epoch ms>}`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    pub render_count: u32,
    pub total_cost: Cost,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_reset: DateTime<Utc>,
}

impl UsageStats {
    /// A zeroed record whose window starts at `now`, truncated to the
    /// millisecond precision it is persisted with
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            render_count: 0,
            total_cost: Cost::ZERO,
            last_reset: DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now),
        }
    }

    /// When the current window ends
    #[inline]
    pub fn window_end(&self) -> DateTime<Utc> {
        self.last_reset + USAGE_WINDOW
    }

    /// Strictly more than one window has elapsed since the last reset
    #[inline]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.last_reset) > USAGE_WINDOW
    }

    /// Rejects records that deserialize but break the non-negative cost invariant
    pub(crate) fn is_well_formed(&self) -> bool {
        let cost = self.total_cost.value();
        cost.is_finite() && cost >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_usage_stats_wire_format() {
        let json = r#"{"renderCount":3,"totalCost":5.8,"lastReset":1700000000000}"#;
        let stats: UsageStats = serde_json::from_str(json).unwrap();

        assert_eq!(stats.render_count, 3);
        assert_eq!(stats.total_cost, Cost::new(5.8));
        assert_eq!(stats.last_reset.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(serde_json::to_string(&stats).unwrap(), json);
    }

    #[test]
    fn test_negative_count_is_rejected() {
        let json = r#"{"renderCount":-1,"totalCost":0,"lastReset":1700000000000}"#;
        assert!(serde_json::from_str::<UsageStats>(json).is_err());
    }

    #[test]
    fn test_expiry_is_strict() {
        let start = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let stats = UsageStats::fresh(start);

        assert!(!stats.is_expired(start + Duration::hours(24)));
        assert!(stats.is_expired(start + Duration::hours(24) + Duration::milliseconds(1)));
        assert_eq!(stats.window_end(), start + Duration::hours(24));
    }

    #[test]
    fn test_negative_cost_is_not_well_formed() {
        let mut stats = UsageStats::fresh(Utc::now());
        assert!(stats.is_well_formed());
        stats.total_cost = Cost::new(-1.0);
        assert!(!stats.is_well_formed());
    }
}
