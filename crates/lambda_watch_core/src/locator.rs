//! Discovery of the log stream that received an invocation.
//!
//! Each round re-lists the group (the target stream may not exist yet) and
//! scans the streams one at a time, in listing order, for the start marker.
//! The first stream containing it wins; later streams in the round are not
//! fetched.

use std::time::Duration;

use tracing::debug;

use crate::error::{LogPlatformError, PollError};
use crate::markers::MarkerFilter;
use crate::platform::LogPlatform;
use crate::poll::{poll_until, PollLimits, PollStep};
use crate::settings::DEFAULT_LOCATE_INTERVAL_SECS;

/// A stream known to contain the invocation's start marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedStream {
    pub log_group: String,
    pub log_stream: String,
    pub from_timestamp: i64,
}

pub struct LogStreamLocator<'a, P: ?Sized> {
    platform: &'a P,
    filter: MarkerFilter,
    interval: Duration,
}

impl<'a, P: LogPlatform + ?Sized> LogStreamLocator<'a, P> {
    pub fn new(platform: &'a P, filter: MarkerFilter) -> Self {
        Self {
            platform,
            filter,
            interval: Duration::from_secs(DEFAULT_LOCATE_INTERVAL_SECS),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// One listing plus a serial scan of every listed stream.
    pub async fn search_round(
        &self,
        log_group: &str,
        from_timestamp: i64,
    ) -> Result<PollStep<LocatedStream>, LogPlatformError> {
        let streams = self.platform.list_streams(log_group).await?;
        debug!(log_group, stream_count = streams.len(), "log_streams_listed");

        for stream in streams {
            let events = self
                .platform
                .get_stream_events(log_group, &stream.name, from_timestamp)
                .await?;
            if events.iter().any(|event| self.filter.is_start(event)) {
                return Ok(PollStep::Found(LocatedStream {
                    log_group: log_group.to_string(),
                    log_stream: stream.name,
                    from_timestamp,
                }));
            }
        }

        Ok(PollStep::NotYet)
    }

    pub async fn locate(
        &self,
        log_group: &str,
        from_timestamp: i64,
        limits: &PollLimits,
    ) -> Result<LocatedStream, PollError> {
        poll_until(self.interval, limits, move |round| async move {
            debug!(log_group, round, "stream_search_round");
            self.search_round(log_group, from_timestamp).await
        })
        .await
    }
}
