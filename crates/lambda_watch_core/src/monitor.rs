//! Orchestration of one invocation's log correlation.
//!
//! The run is a small state machine:
//!
//! ```text
//! SEARCHING_STREAM -> WAITING_FOR_END -> COLLECTING -> DONE
//!         \                 \                 \
//!          +-----------------+-----------------+--> FAILED
//! ```
//!
//! Each state carries the typed result of the stage before it, so a stage can
//! only run once its input exists. Collection is deferred until the end
//! marker has been seen; reading earlier can observe a window that is still
//! arriving.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::collector::EventCollector;
use crate::end_detector::{CompletedStream, EndOfInvocationDetector};
use crate::error::{MonitorError, PollError};
use crate::events::{InvocationRequest, LogEvent};
use crate::locator::{LocatedStream, LogStreamLocator};
use crate::markers::MarkerFilter;
use crate::platform::LogPlatform;
use crate::poll::PollLimits;
use crate::settings::WatchSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonitorPhase {
    SearchingStream,
    WaitingForEnd,
    Collecting,
    Done,
    Failed,
}

impl MonitorPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SearchingStream => "SEARCHING_STREAM",
            Self::WaitingForEnd => "WAITING_FOR_END",
            Self::Collecting => "COLLECTING",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for MonitorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the display collaborator receives for one finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationLogs {
    pub request: InvocationRequest,
    pub log_stream: String,
    pub events: Vec<LogEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorState {
    SearchingStream,
    WaitingForEnd(LocatedStream),
    Collecting(CompletedStream),
    Done(InvocationLogs),
    Failed(MonitorError),
}

impl MonitorState {
    pub fn phase(&self) -> MonitorPhase {
        match self {
            Self::SearchingStream => MonitorPhase::SearchingStream,
            Self::WaitingForEnd(_) => MonitorPhase::WaitingForEnd,
            Self::Collecting(_) => MonitorPhase::Collecting,
            Self::Done(_) => MonitorPhase::Done,
            Self::Failed(_) => MonitorPhase::Failed,
        }
    }
}

/// Drives one invocation through locate, wait and collect.
///
/// A monitor tracks exactly one request. Watching several invocations at once
/// takes one monitor each; they share nothing but the platform client.
pub struct InvocationMonitor<'a, P: ?Sized> {
    platform: &'a P,
    request: InvocationRequest,
    settings: WatchSettings,
    filter: MarkerFilter,
}

impl<'a, P: LogPlatform + ?Sized> InvocationMonitor<'a, P> {
    pub fn new(platform: &'a P, request: InvocationRequest, settings: WatchSettings) -> Self {
        let filter = MarkerFilter::new(&request.request_id);
        Self {
            platform,
            request,
            settings,
            filter,
        }
    }

    /// Limits for a run starting now: the configured timeout bounds the whole
    /// pipeline, and `cancel` stops it from outside.
    pub fn limits(&self, cancel: CancellationToken) -> PollLimits {
        PollLimits::with_timeout(self.settings.timeout()).with_cancel(cancel)
    }

    pub async fn run(&self, cancel: CancellationToken) -> Result<InvocationLogs, MonitorError> {
        let limits = self.limits(cancel);
        self.run_with_limits(&limits).await
    }

    pub async fn run_with_limits(&self, limits: &PollLimits) -> Result<InvocationLogs, MonitorError> {
        info!(
            function_name = %self.request.function_name,
            request_id = %self.request.request_id,
            start_time = self.request.start_time,
            "invocation_monitor_started"
        );

        let mut state = MonitorState::SearchingStream;
        loop {
            state = match state {
                MonitorState::Done(logs) => return Ok(logs),
                MonitorState::Failed(error) => return Err(error),
                active => self.advance(active, limits).await,
            };
        }
    }

    /// Performs the single transition out of `state`. Terminal states are
    /// returned unchanged.
    pub async fn advance(&self, state: MonitorState, limits: &PollLimits) -> MonitorState {
        let phase = state.phase();
        let next = match state {
            MonitorState::SearchingStream => {
                let log_group = self.request.log_group();
                let from_timestamp = self.settings.fetch_lower_bound(self.request.start_time);
                LogStreamLocator::new(self.platform, self.filter.clone())
                    .with_interval(self.settings.locate_interval())
                    .locate(&log_group, from_timestamp, limits)
                    .await
                    .map(MonitorState::WaitingForEnd)
            }
            MonitorState::WaitingForEnd(located) => {
                EndOfInvocationDetector::new(self.platform, self.filter.clone())
                    .with_interval(self.settings.end_interval())
                    .wait_for_end(located, limits)
                    .await
                    .map(MonitorState::Collecting)
            }
            MonitorState::Collecting(completed) => {
                EventCollector::new(self.platform, self.filter.clone())
                    .collect(&completed, limits)
                    .await
                    .map(|events| {
                        MonitorState::Done(InvocationLogs {
                            request: self.request.clone(),
                            log_stream: completed.into_located().log_stream,
                            events,
                        })
                    })
            }
            terminal @ (MonitorState::Done(_) | MonitorState::Failed(_)) => return terminal,
        };

        match next {
            Ok(next) => {
                self.log_transition(phase, &next);
                next
            }
            Err(source) => self.fail(phase, source),
        }
    }

    fn log_transition(&self, from: MonitorPhase, next: &MonitorState) {
        match next {
            MonitorState::WaitingForEnd(located) => info!(
                request_id = %self.request.request_id,
                from = %from,
                to = %next.phase(),
                log_stream = %located.log_stream,
                "log_stream_found"
            ),
            MonitorState::Done(logs) => info!(
                request_id = %self.request.request_id,
                from = %from,
                to = %next.phase(),
                event_count = logs.events.len(),
                "invocation_events_collected"
            ),
            _ => info!(
                request_id = %self.request.request_id,
                from = %from,
                to = %next.phase(),
                "monitor_phase_changed"
            ),
        }
    }

    fn fail(&self, phase: MonitorPhase, source: PollError) -> MonitorState {
        warn!(
            request_id = %self.request.request_id,
            phase = %phase,
            error = %source,
            "invocation_monitor_failed"
        );
        MonitorState::Failed(MonitorError { phase, source })
    }
}
