use crate::ledger::time_until_reset;
use crate::types::UsageStats;
use chrono::{DateTime, Duration, Utc};
use colored::{ColoredString, Colorize};
use std::fmt;

/// Represents the remaining time until the usage window resets
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct RemainingTime(Duration);

impl RemainingTime {
    /// Create from minutes
    pub fn new(minutes: i64) -> Self {
        RemainingTime(Duration::minutes(minutes))
    }

    /// Calculate remaining time from usage stats
    pub fn from_usage_stats(stats: &UsageStats, now: DateTime<Utc>) -> Self {
        RemainingTime(time_until_reset(stats, now))
    }

    /// Check if there's time remaining, down to the millisecond
    pub fn has_remaining(&self) -> bool {
        self.0 > Duration::zero()
    }

    /// Format as a readable string (e.g., "2h 30m left"); under a minute reads "0h 0m left"
    pub fn to_formatted_string(&self) -> String {
        if !self.has_remaining() {
            return "Resetting...".to_string();
        }
        let minutes = self.0.num_minutes();
        format!("{}h {}m left", minutes / 60, minutes % 60)
    }

    /// Get a colored string representation for terminal output
    pub fn to_colored_string(&self) -> ColoredString {
        self.to_formatted_string().magenta()
    }
}

impl fmt::Display for RemainingTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_formatted_string())
    }
}

impl From<Duration> for RemainingTime {
    fn from(remaining: Duration) -> Self {
        RemainingTime(remaining)
    }
}
