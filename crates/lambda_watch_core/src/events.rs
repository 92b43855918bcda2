use serde::{Deserialize, Serialize};

const LOG_GROUP_PREFIX: &str = "/aws/lambda/";

/// A single line fetched from a log stream. Timestamps are epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    pub timestamp: i64,
    pub message: String,
}

impl LogEvent {
    pub fn new(timestamp: i64, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            message: message.into(),
        }
    }
}

/// A stream as listed in one poll round. Never cached across rounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogStream {
    pub name: String,
}

impl LogStream {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// What the invocation collaborator hands over once an asynchronous invoke
/// has been accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationRequest {
    pub function_name: String,
    pub request_id: String,
    /// Lower bound (epoch milliseconds) for every event fetch of this invocation.
    pub start_time: i64,
}

impl InvocationRequest {
    pub fn log_group(&self) -> String {
        log_group_name(&self.function_name)
    }
}

pub fn log_group_name(function_name: &str) -> String {
    format!("{LOG_GROUP_PREFIX}{function_name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_group_uses_lambda_prefix() {
        let request = InvocationRequest {
            function_name: "greeter".to_string(),
            request_id: "abc-123".to_string(),
            start_time: 0,
        };

        assert_eq!(request.log_group(), "/aws/lambda/greeter");
    }
}
