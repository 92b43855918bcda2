use thiserror::Error;

use crate::monitor::MonitorPhase;

/// A failed call against the log platform (network, auth, throttling).
///
/// Never retried inside a poll round; only the absence of a match schedules
/// another round.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} failed: {message}")]
pub struct LogPlatformError {
    pub operation: &'static str,
    pub message: String,
}

impl LogPlatformError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    #[error(transparent)]
    Transport(#[from] LogPlatformError),
    #[error("deadline expired before a match was observed")]
    TimedOut,
    #[error("polling was cancelled")]
    Cancelled,
}

/// Terminal failure of one monitor run, tagged with the phase that was active.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invocation monitor failed while {phase}: {source}")]
pub struct MonitorError {
    pub phase: MonitorPhase,
    #[source]
    pub source: PollError,
}

impl MonitorError {
    pub fn is_timeout(&self) -> bool {
        matches!(self.source, PollError::TimedOut)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.source, PollError::Cancelled)
    }
}
