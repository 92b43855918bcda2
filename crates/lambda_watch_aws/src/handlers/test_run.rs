//! The `test` flow: render, invoke, follow the logs, display.

use std::io::Write;

use anyhow::Context;
use lambda_watch_core::{InvocationLogs, InvocationMonitor, LogPlatform, WatchSettings};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::adapters::invoke::FunctionInvoker;
use crate::display::{display_block, display_events};

pub async fn run_invocation_test<I, P, W>(
    invoker: &I,
    platform: &P,
    function_name: &str,
    event: &Value,
    settings: &WatchSettings,
    cancel: CancellationToken,
    out: &mut W,
) -> anyhow::Result<InvocationLogs>
where
    I: FunctionInvoker + ?Sized,
    P: LogPlatform + ?Sized,
    W: Write,
{
    let payload = serde_json::to_vec(event).context("failed to serialize event")?;
    let pretty = serde_json::to_string_pretty(event).context("failed to serialize event")?;
    display_block(out, "Event object", &pretty)?;

    let request = invoker.invoke_async(function_name, &payload).await?;
    info!(
        function_name,
        request_id = %request.request_id,
        log_group = %request.log_group(),
        "invocation_accepted"
    );

    let logs = InvocationMonitor::new(platform, request, settings.clone())
        .run(cancel)
        .await
        .with_context(|| format!("failed to follow logs of {function_name}"))?;

    display_events(out, &logs.events)?;
    writeln!(out, "Test complete.")?;
    Ok(logs)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use lambda_watch_core::test_helpers::{invocation_stream, ScriptedLogPlatform};
    use lambda_watch_core::{InvocationRequest, MonitorError, MonitorPhase};
    use serde_json::json;

    use super::*;
    use crate::adapters::invoke::InvokeError;

    struct CapturingInvoker {
        request_id: Option<&'static str>,
        payloads: Mutex<Vec<Vec<u8>>>,
    }

    impl CapturingInvoker {
        fn new(request_id: Option<&'static str>) -> Self {
            Self {
                request_id,
                payloads: Mutex::new(Vec::new()),
            }
        }

        fn payloads(&self) -> Vec<Vec<u8>> {
            self.payloads.lock().expect("poisoned mutex").clone()
        }
    }

    #[async_trait]
    impl FunctionInvoker for CapturingInvoker {
        async fn invoke_async(
            &self,
            function_name: &str,
            payload: &[u8],
        ) -> Result<InvocationRequest, InvokeError> {
            self.payloads
                .lock()
                .expect("poisoned mutex")
                .push(payload.to_vec());
            let request_id = self.request_id.ok_or_else(|| InvokeError::MissingRequestId {
                function_name: function_name.to_string(),
            })?;
            Ok(InvocationRequest {
                function_name: function_name.to_string(),
                request_id: request_id.to_string(),
                start_time: 1_000,
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn displays_event_and_collected_window() {
        let invoker = CapturingInvoker::new(Some("abc-123"));
        let platform = ScriptedLogPlatform::new()
            .with_streams(&["A", "B"])
            .with_events("B", invocation_stream(1_000, "abc-123"));
        let mut out = Vec::new();

        let logs = run_invocation_test(
            &invoker,
            &platform,
            "greeter",
            &json!({"name": "world"}),
            &WatchSettings::default(),
            CancellationToken::new(),
            &mut out,
        )
        .await
        .expect("test run should succeed");

        assert_eq!(logs.log_stream, "B");
        assert_eq!(logs.events.len(), 3);
        assert_eq!(invoker.payloads(), vec![br#"{"name":"world"}"#.to_vec()]);

        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("Event object"));
        assert!(text.contains(": START RequestId: abc-123\n"));
        assert!(text.contains(": hello\n"));
        assert!(!text.contains("random-after"));
        assert!(text.trim_end().ends_with("Test complete."));
    }

    #[tokio::test(start_paused = true)]
    async fn invoke_failure_skips_monitoring() {
        let invoker = CapturingInvoker::new(None);
        let platform = ScriptedLogPlatform::new().with_streams(&["A"]);
        let mut out = Vec::new();

        let error = run_invocation_test(
            &invoker,
            &platform,
            "greeter",
            &json!({}),
            &WatchSettings::default(),
            CancellationToken::new(),
            &mut out,
        )
        .await
        .expect_err("test run should fail");

        assert!(error.downcast_ref::<InvokeError>().is_some());
        assert!(platform.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn monitor_timeout_is_surfaced() {
        let invoker = CapturingInvoker::new(Some("abc-123"));
        let platform = ScriptedLogPlatform::new().with_streams(&["A"]);
        let settings = WatchSettings {
            timeout_secs: Some(30),
            ..WatchSettings::default()
        };
        let mut out = Vec::new();

        let error = run_invocation_test(
            &invoker,
            &platform,
            "greeter",
            &json!({}),
            &settings,
            CancellationToken::new(),
            &mut out,
        )
        .await
        .expect_err("test run should time out");

        let monitor_error = error
            .downcast_ref::<MonitorError>()
            .expect("monitor error in chain");
        assert_eq!(monitor_error.phase, MonitorPhase::SearchingStream);
        assert!(monitor_error.is_timeout());
        assert!(!String::from_utf8(out).expect("utf8").contains("Test complete."));
    }
}
