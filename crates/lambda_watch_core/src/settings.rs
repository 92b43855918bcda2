use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_LOCATE_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_END_INTERVAL_SECS: u64 = 1;
pub const DEFAULT_TIMEOUT_SECS: u64 = 1_200;
/// Shortest pause between poll rounds; zero would hammer the log service.
pub const MIN_INTERVAL_SECS: u64 = 1;

/// Timing knobs for one monitor run.
///
/// `timeout_secs: None` restores unbounded waiting; the default bounds the
/// whole run so an invocation that never logs cannot block forever.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchSettings {
    pub locate_interval_secs: u64,
    pub end_interval_secs: u64,
    pub timeout_secs: Option<u64>,
    pub clock_skew_allowance_secs: u64,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            locate_interval_secs: DEFAULT_LOCATE_INTERVAL_SECS,
            end_interval_secs: DEFAULT_END_INTERVAL_SECS,
            timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
            clock_skew_allowance_secs: 0,
        }
    }
}

impl WatchSettings {
    pub fn locate_interval(&self) -> Duration {
        Duration::from_secs(self.locate_interval_secs.max(MIN_INTERVAL_SECS))
    }

    pub fn end_interval(&self) -> Duration {
        Duration::from_secs(self.end_interval_secs.max(MIN_INTERVAL_SECS))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Lower bound for event fetches given the moment the invoke was issued.
    pub fn fetch_lower_bound(&self, start_time: i64) -> i64 {
        let skew_ms = i64::try_from(self.clock_skew_allowance_secs.saturating_mul(1_000))
            .unwrap_or(i64::MAX);
        start_time.saturating_sub(skew_ms)
    }
}
