//! Invocation log correlation engine.
//!
//! This crate owns the deterministic part of watching one asynchronous
//! function invocation: locating the log stream that received it, waiting for
//! the platform to flush its end marker, and extracting the exact start..end
//! window of log events. It intentionally excludes AWS SDK concerns; the log
//! platform is reached only through the [`platform::LogPlatform`] trait.

pub mod collector;
pub mod end_detector;
pub mod error;
pub mod events;
pub mod locator;
pub mod markers;
pub mod monitor;
pub mod platform;
pub mod poll;
pub mod settings;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use error::{LogPlatformError, MonitorError, PollError};
pub use events::{log_group_name, InvocationRequest, LogEvent, LogStream};
pub use monitor::{InvocationLogs, InvocationMonitor, MonitorPhase};
pub use platform::LogPlatform;
pub use settings::WatchSettings;
