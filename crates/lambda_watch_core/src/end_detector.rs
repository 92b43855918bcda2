use std::time::Duration;

use tracing::debug;

use crate::error::{LogPlatformError, PollError};
use crate::locator::LocatedStream;
use crate::markers::MarkerFilter;
use crate::platform::LogPlatform;
use crate::poll::{poll_until, PollLimits, PollStep};
use crate::settings::DEFAULT_END_INTERVAL_SECS;

/// A located stream whose end marker has been observed, so the whole
/// start..end window is durably present on the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedStream(LocatedStream);

impl CompletedStream {
    pub(crate) fn new(located: LocatedStream) -> Self {
        Self(located)
    }

    pub fn located(&self) -> &LocatedStream {
        &self.0
    }

    pub fn into_located(self) -> LocatedStream {
        self.0
    }
}

/// Blocks until the already-located stream shows the end marker. Every round
/// is a full re-read from the lower bound.
pub struct EndOfInvocationDetector<'a, P: ?Sized> {
    platform: &'a P,
    filter: MarkerFilter,
    interval: Duration,
}

impl<'a, P: LogPlatform + ?Sized> EndOfInvocationDetector<'a, P> {
    pub fn new(platform: &'a P, filter: MarkerFilter) -> Self {
        Self {
            platform,
            filter,
            interval: Duration::from_secs(DEFAULT_END_INTERVAL_SECS),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub async fn check_round(&self, stream: &LocatedStream) -> Result<PollStep<()>, LogPlatformError> {
        let events = self
            .platform
            .get_stream_events(&stream.log_group, &stream.log_stream, stream.from_timestamp)
            .await?;

        if events.iter().any(|event| self.filter.is_end(event)) {
            Ok(PollStep::Found(()))
        } else {
            Ok(PollStep::NotYet)
        }
    }

    pub async fn wait_for_end(
        &self,
        stream: LocatedStream,
        limits: &PollLimits,
    ) -> Result<CompletedStream, PollError> {
        let target = &stream;
        poll_until(self.interval, limits, move |round| async move {
            debug!(log_stream = %target.log_stream, round, "end_marker_round");
            self.check_round(target).await
        })
        .await?;

        Ok(CompletedStream::new(stream))
    }
}
