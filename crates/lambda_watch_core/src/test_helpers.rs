//! Test helpers for driving the engine without a real log platform.
//!
//! [`ScriptedLogPlatform`] answers each call from a per-call script and
//! records every call together with the (virtual) instant it was made, so
//! tests running under `tokio::time::pause` can assert poll spacing exactly.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::LogPlatformError;
use crate::events::{LogEvent, LogStream};
use crate::platform::LogPlatform;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    ListStreams {
        log_group: String,
    },
    GetStreamEvents {
        log_group: String,
        log_stream: String,
        from_timestamp: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub at: Instant,
    pub call: PlatformCall,
}

/// Responses handed out one per call; the last one repeats forever.
#[derive(Debug, Clone)]
struct Rounds<T> {
    queue: VecDeque<Result<T, LogPlatformError>>,
}

impl<T: Clone> Rounds<T> {
    fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    fn next(&mut self) -> Option<Result<T, LogPlatformError>> {
        if self.queue.len() > 1 {
            self.queue.pop_front()
        } else {
            self.queue.front().cloned()
        }
    }
}

#[derive(Debug)]
struct ScriptState {
    stream_rounds: Rounds<Vec<String>>,
    event_rounds: HashMap<String, Rounds<Vec<LogEvent>>>,
    calls: Vec<RecordedCall>,
}

#[derive(Debug)]
pub struct ScriptedLogPlatform {
    state: Mutex<ScriptState>,
}

impl Default for ScriptedLogPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedLogPlatform {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ScriptState {
                stream_rounds: Rounds::new(),
                event_rounds: HashMap::new(),
                calls: Vec::new(),
            }),
        }
    }

    /// Every `list_streams` call returns `names`.
    pub fn with_streams(self, names: &[&str]) -> Self {
        self.with_stream_rounds(vec![names.to_vec()])
    }

    /// The n-th `list_streams` call returns the n-th list; the last repeats.
    pub fn with_stream_rounds(self, rounds: Vec<Vec<&str>>) -> Self {
        {
            let mut state = self.lock();
            for names in rounds {
                state
                    .stream_rounds
                    .queue
                    .push_back(Ok(names.into_iter().map(str::to_string).collect()));
            }
        }
        self
    }

    pub fn with_list_failure(self, message: &str) -> Self {
        self.lock()
            .stream_rounds
            .queue
            .push_back(Err(LogPlatformError::new("ListStreams", message)));
        self
    }

    /// Every fetch of `stream` returns `events` (filtered by the lower bound).
    pub fn with_events(self, stream: &str, events: Vec<LogEvent>) -> Self {
        self.with_event_rounds(stream, vec![events])
    }

    /// The n-th fetch of `stream` sees the n-th snapshot; the last repeats.
    pub fn with_event_rounds(self, stream: &str, rounds: Vec<Vec<LogEvent>>) -> Self {
        {
            let mut state = self.lock();
            let entry = state
                .event_rounds
                .entry(stream.to_string())
                .or_insert_with(Rounds::new);
            for events in rounds {
                entry.queue.push_back(Ok(events));
            }
        }
        self
    }

    pub fn with_events_failure(self, stream: &str, message: &str) -> Self {
        self.lock()
            .event_rounds
            .entry(stream.to_string())
            .or_insert_with(Rounds::new)
            .queue
            .push_back(Err(LogPlatformError::new("GetStreamEvents", message)));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    pub fn list_calls(&self) -> Vec<Instant> {
        self.calls()
            .into_iter()
            .filter(|recorded| matches!(recorded.call, PlatformCall::ListStreams { .. }))
            .map(|recorded| recorded.at)
            .collect()
    }

    pub fn event_fetches(&self, stream: &str) -> Vec<Instant> {
        self.calls()
            .into_iter()
            .filter(|recorded| {
                matches!(
                    &recorded.call,
                    PlatformCall::GetStreamEvents { log_stream, .. } if log_stream == stream
                )
            })
            .map(|recorded| recorded.at)
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptState> {
        self.state.lock().expect("scripted platform mutex poisoned")
    }
}

#[async_trait]
impl LogPlatform for ScriptedLogPlatform {
    async fn list_streams(&self, log_group: &str) -> Result<Vec<LogStream>, LogPlatformError> {
        let mut state = self.lock();
        state.calls.push(RecordedCall {
            at: Instant::now(),
            call: PlatformCall::ListStreams {
                log_group: log_group.to_string(),
            },
        });
        let names = state.stream_rounds.next().unwrap_or_else(|| Ok(Vec::new()))?;
        Ok(names.into_iter().map(LogStream::new).collect())
    }

    async fn get_stream_events(
        &self,
        log_group: &str,
        log_stream: &str,
        from_timestamp: i64,
    ) -> Result<Vec<LogEvent>, LogPlatformError> {
        let mut state = self.lock();
        state.calls.push(RecordedCall {
            at: Instant::now(),
            call: PlatformCall::GetStreamEvents {
                log_group: log_group.to_string(),
                log_stream: log_stream.to_string(),
                from_timestamp,
            },
        });
        let events = state
            .event_rounds
            .get_mut(log_stream)
            .and_then(Rounds::next)
            .unwrap_or_else(|| Ok(Vec::new()))?;
        Ok(events
            .into_iter()
            .filter(|event| event.timestamp >= from_timestamp)
            .collect())
    }
}

/// The five-event stream used throughout the tests: noise, the invocation
/// window for `request_id`, noise. Timestamps are `base + 1..=5`.
pub fn invocation_stream(base: i64, request_id: &str) -> Vec<LogEvent> {
    vec![
        LogEvent::new(base + 1, "random"),
        LogEvent::new(base + 2, format!("START RequestId: {request_id}\n")),
        LogEvent::new(base + 3, "hello"),
        LogEvent::new(base + 4, format!("END RequestId: {request_id}\n")),
        LogEvent::new(base + 5, "random-after"),
    ]
}
