use async_trait::async_trait;

use crate::error::LogPlatformError;
use crate::events::{LogEvent, LogStream};

/// Read-only view of the log platform consumed by the correlation engine.
///
/// Implementations hold no per-invocation state; one client may back any
/// number of independent monitor runs.
#[async_trait]
pub trait LogPlatform: Send + Sync {
    /// Current streams of the group. Unordered, and membership may change
    /// between calls.
    async fn list_streams(&self, log_group: &str) -> Result<Vec<LogStream>, LogPlatformError>;

    /// Every event of the stream at or after `from_timestamp`, read from the
    /// head in chronological order.
    async fn get_stream_events(
        &self,
        log_group: &str,
        log_stream: &str,
        from_timestamp: i64,
    ) -> Result<Vec<LogEvent>, LogPlatformError>;
}
