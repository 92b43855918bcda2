//! Fixed-interval polling with an explicit deadline and cancellation signal.
//!
//! A round runs immediately; when it reports [`PollStep::NotYet`] the limits
//! are checked and, if still open, the next round starts after a full
//! interval. Both the round itself and the sleep race the limits, so a run
//! never outlives its deadline or a cancellation request.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{LogPlatformError, PollError};

/// Outcome of one poll round that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep<T> {
    Found(T),
    NotYet,
}

#[derive(Debug, Clone, Default)]
pub struct PollLimits {
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl PollLimits {
    /// No deadline and a token nobody else holds. Only an external process
    /// exit stops a wait under these limits.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// A timeout too large to represent as an instant leaves the run
    /// without a deadline.
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self {
            deadline: timeout.and_then(|timeout| Instant::now().checked_add(timeout)),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn check(&self) -> Result<(), PollError> {
        if self.cancel.is_cancelled() {
            return Err(PollError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(PollError::TimedOut),
            _ => Ok(()),
        }
    }

    /// Drive `future` to completion unless cancellation or the deadline comes
    /// first. Cancellation wins ties, then the deadline.
    pub async fn guard<F: Future>(&self, future: F) -> Result<F::Output, PollError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(PollError::Cancelled),
            _ = sleep_until_deadline(self.deadline) => Err(PollError::TimedOut),
            output = future => Ok(output),
        }
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

/// Repeat `round` every `interval` until it finds a value.
///
/// `round` receives the 1-based round number. Transport errors end the poll
/// immediately.
pub async fn poll_until<T, F, Fut>(
    interval: Duration,
    limits: &PollLimits,
    mut round: F,
) -> Result<T, PollError>
where
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = Result<PollStep<T>, LogPlatformError>>,
{
    let mut round_number = 1u64;
    loop {
        if let PollStep::Found(value) = limits.guard(round(round_number)).await?? {
            return Ok(value);
        }

        limits.check()?;
        limits.guard(tokio::time::sleep(interval)).await?;
        round_number += 1;
    }
}
