//! Extraction of one invocation's contiguous log window.

use tracing::debug;

use crate::end_detector::CompletedStream;
use crate::error::PollError;
use crate::events::LogEvent;
use crate::markers::MarkerFilter;
use crate::platform::LogPlatform;
use crate::poll::PollLimits;

/// Returns the events from the start marker through the end marker, both
/// included. Processing stops at the first end marker, so anything after it
/// (including a later start/end pair) is never examined. An end marker seen
/// before any start marker therefore yields an empty window.
pub fn extract_invocation_window<I>(events: I, filter: &MarkerFilter) -> Vec<LogEvent>
where
    I: IntoIterator<Item = LogEvent>,
{
    let mut inside = false;
    let mut window = Vec::new();

    for event in events {
        if filter.is_start(&event) {
            inside = true;
        }
        let is_end = filter.is_end(&event);
        if inside {
            window.push(event);
        }
        if is_end {
            break;
        }
    }

    window
}

pub struct EventCollector<'a, P: ?Sized> {
    platform: &'a P,
    filter: MarkerFilter,
}

impl<'a, P: LogPlatform + ?Sized> EventCollector<'a, P> {
    pub fn new(platform: &'a P, filter: MarkerFilter) -> Self {
        Self { platform, filter }
    }

    /// Re-reads the completed stream once and extracts the invocation window.
    pub async fn collect(
        &self,
        stream: &CompletedStream,
        limits: &PollLimits,
    ) -> Result<Vec<LogEvent>, PollError> {
        let located = stream.located();
        let events = limits
            .guard(self.platform.get_stream_events(
                &located.log_group,
                &located.log_stream,
                located.from_timestamp,
            ))
            .await??;
        let fetched = events.len();
        let window = extract_invocation_window(events, &self.filter);
        debug!(
            log_stream = %located.log_stream,
            fetched,
            collected = window.len(),
            "invocation_window_extracted"
        );
        Ok(window)
    }
}
