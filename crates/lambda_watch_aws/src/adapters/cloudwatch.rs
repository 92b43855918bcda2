//! CloudWatch Logs implementation of the engine's log platform seam.

use std::future::Future;

use async_trait::async_trait;
use aws_sdk_cloudwatchlogs::error::DisplayErrorContext;
use aws_sdk_cloudwatchlogs::types::OutputLogEvent;
use lambda_watch_core::{LogEvent, LogPlatform, LogPlatformError, LogStream};
use tracing::debug;

const DESCRIBE_LOG_STREAMS: &str = "DescribeLogStreams";
const GET_LOG_EVENTS: &str = "GetLogEvents";

#[derive(Debug, Clone)]
pub struct CloudWatchLogPlatform {
    client: aws_sdk_cloudwatchlogs::Client,
}

impl CloudWatchLogPlatform {
    pub fn new(client: aws_sdk_cloudwatchlogs::Client) -> Self {
        Self { client }
    }
}

/// One response of a token-paginated call.
struct Page<T> {
    items: Vec<T>,
    next_token: Option<String>,
}

/// Follows `next_token` until the service stops returning one.
async fn drain_pages<T, F, Fut>(mut fetch: F) -> Result<Vec<T>, LogPlatformError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, LogPlatformError>>,
{
    let mut items = Vec::new();
    let mut next_token = None;

    loop {
        let page = fetch(next_token.take()).await?;
        items.extend(page.items);
        match page.next_token {
            Some(token) => next_token = Some(token),
            None => return Ok(items),
        }
    }
}

/// Follows forward tokens. The end of the stream is reached once the service
/// hands back the token that was just sent; an empty page with a new token
/// is not the end.
async fn drain_forward_pages<T, F, Fut>(mut fetch: F) -> Result<(Vec<T>, usize), LogPlatformError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, LogPlatformError>>,
{
    let mut items = Vec::new();
    let mut sent_token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = fetch(sent_token.clone()).await?;
        pages += 1;
        items.extend(page.items);
        match page.next_token {
            Some(token) if sent_token.as_deref() != Some(token.as_str()) => {
                sent_token = Some(token);
            }
            _ => return Ok((items, pages)),
        }
    }
}

#[async_trait]
impl LogPlatform for CloudWatchLogPlatform {
    async fn list_streams(&self, log_group: &str) -> Result<Vec<LogStream>, LogPlatformError> {
        drain_pages(move |next_token| async move {
            self.client
                .describe_log_streams()
                .log_group_name(log_group)
                .set_next_token(next_token)
                .send()
                .await
                .map(|output| Page {
                    items: output
                        .log_streams()
                        .iter()
                        .filter_map(|stream| stream.log_stream_name())
                        .map(LogStream::new)
                        .collect(),
                    next_token: output.next_token().map(str::to_string),
                })
                .map_err(|error| {
                    LogPlatformError::new(
                        DESCRIBE_LOG_STREAMS,
                        DisplayErrorContext(&error).to_string(),
                    )
                })
        })
        .await
    }

    async fn get_stream_events(
        &self,
        log_group: &str,
        log_stream: &str,
        from_timestamp: i64,
    ) -> Result<Vec<LogEvent>, LogPlatformError> {
        let (events, pages) = drain_forward_pages(move |next_token| async move {
            self.client
                .get_log_events()
                .log_group_name(log_group)
                .log_stream_name(log_stream)
                .start_time(from_timestamp)
                .start_from_head(true)
                .set_next_token(next_token)
                .send()
                .await
                .map(|output| Page {
                    items: output.events().iter().filter_map(to_log_event).collect(),
                    next_token: output.next_forward_token().map(str::to_string),
                })
                .map_err(|error| {
                    LogPlatformError::new(GET_LOG_EVENTS, DisplayErrorContext(&error).to_string())
                })
        })
        .await?;

        debug!(log_group, log_stream, pages, event_count = events.len(), "log_events_fetched");
        Ok(events)
    }
}

fn to_log_event(event: &OutputLogEvent) -> Option<LogEvent> {
    Some(LogEvent::new(
        event.timestamp()?,
        event.message().unwrap_or_default(),
    ))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use aws_sdk_cloudwatchlogs::operation::describe_log_streams::DescribeLogStreamsOutput;
    use aws_sdk_cloudwatchlogs::operation::get_log_events::GetLogEventsOutput;
    use aws_sdk_cloudwatchlogs::types::LogStream as SdkLogStream;
    use aws_sdk_cloudwatchlogs::Client;
    use aws_smithy_mocks::{mock, mock_client, RuleMode};

    use super::*;

    #[test]
    fn converts_output_events() {
        let event = OutputLogEvent::builder()
            .timestamp(42)
            .message("START RequestId: abc\n")
            .ingestion_time(50)
            .build();

        assert_eq!(
            to_log_event(&event),
            Some(LogEvent::new(42, "START RequestId: abc\n"))
        );
    }

    #[test]
    fn drops_events_without_timestamp() {
        let event = OutputLogEvent::builder().message("orphan").build();

        assert_eq!(to_log_event(&event), None);
    }

    fn page<T>(items: Vec<T>, next_token: Option<&str>) -> Page<T> {
        Page {
            items,
            next_token: next_token.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn forward_paging_stops_when_token_repeats() {
        let mut pages = VecDeque::from(vec![
            page(vec![1, 2], Some("f/1")),
            page(vec![3], Some("f/2")),
            page(vec![], Some("f/2")),
        ]);
        let mut sent = Vec::new();

        let (items, fetched) = drain_forward_pages(|token| {
            sent.push(token);
            let next = pages.pop_front().expect("paging should have stopped");
            std::future::ready(Ok(next))
        })
        .await
        .expect("paging should succeed");

        assert_eq!(items, vec![1, 2, 3]);
        assert_eq!(fetched, 3);
        assert_eq!(
            sent,
            vec![None, Some("f/1".to_string()), Some("f/2".to_string())]
        );
    }

    #[tokio::test]
    async fn empty_page_with_new_token_keeps_reading() {
        let mut pages = VecDeque::from(vec![
            page(vec![1], Some("f/1")),
            page(vec![], Some("f/2")),
            page(vec![2], Some("f/3")),
            page(vec![], Some("f/3")),
        ]);

        let (items, fetched) = drain_forward_pages(|_| {
            let next = pages.pop_front().expect("paging should have stopped");
            std::future::ready(Ok(next))
        })
        .await
        .expect("paging should succeed");

        assert_eq!(items, vec![1, 2]);
        assert_eq!(fetched, 4);
    }

    #[tokio::test]
    async fn missing_forward_token_ends_the_stream() {
        let mut pages = VecDeque::from(vec![page(vec![7], None)]);

        let (items, fetched) = drain_forward_pages(|_| {
            let next = pages.pop_front().expect("paging should have stopped");
            std::future::ready(Ok(next))
        })
        .await
        .expect("paging should succeed");

        assert_eq!(items, vec![7]);
        assert_eq!(fetched, 1);
    }

    #[tokio::test]
    async fn listing_follows_next_token_across_pages() {
        let mut pages = VecDeque::from(vec![
            page(vec!["a"], Some("t/1")),
            page(vec!["b", "c"], Some("t/2")),
            page(vec!["d"], None),
        ]);
        let mut sent = Vec::new();

        let items = drain_pages(|token| {
            sent.push(token);
            let next = pages.pop_front().expect("paging should have stopped");
            std::future::ready(Ok(next))
        })
        .await
        .expect("paging should succeed");

        assert_eq!(items, vec!["a", "b", "c", "d"]);
        assert_eq!(
            sent,
            vec![None, Some("t/1".to_string()), Some("t/2".to_string())]
        );
    }

    #[tokio::test]
    async fn failure_on_later_page_drops_earlier_pages() {
        let mut pages = VecDeque::from(vec![
            Ok(page(vec![1], Some("f/1"))),
            Err(LogPlatformError::new(GET_LOG_EVENTS, "throttled")),
        ]);

        let result = drain_forward_pages(|_| {
            let next = pages.pop_front().expect("paging should have stopped");
            std::future::ready(next)
        })
        .await;

        assert_eq!(
            result,
            Err(LogPlatformError::new(GET_LOG_EVENTS, "throttled"))
        );
    }

    fn output_event(timestamp: i64, message: &str) -> OutputLogEvent {
        OutputLogEvent::builder()
            .timestamp(timestamp)
            .message(message)
            .build()
    }

    #[tokio::test]
    async fn client_reads_every_page_of_a_stream() {
        let first = mock!(Client::get_log_events)
            .match_requests(|req| req.next_token().is_none() && req.start_from_head() == Some(true))
            .then_output(|| {
                GetLogEventsOutput::builder()
                    .events(output_event(2, "START RequestId: abc-123\n"))
                    .next_forward_token("f/1")
                    .build()
            });
        let second = mock!(Client::get_log_events)
            .match_requests(|req| req.next_token() == Some("f/1"))
            .then_output(|| {
                GetLogEventsOutput::builder()
                    .next_forward_token("f/2")
                    .build()
            });
        let third = mock!(Client::get_log_events)
            .match_requests(|req| req.next_token() == Some("f/2"))
            .then_output(|| {
                GetLogEventsOutput::builder()
                    .events(output_event(3, "hello"))
                    .events(output_event(4, "END RequestId: abc-123\n"))
                    .next_forward_token("f/3")
                    .build()
            });
        let last = mock!(Client::get_log_events)
            .match_requests(|req| req.next_token() == Some("f/3"))
            .then_output(|| {
                GetLogEventsOutput::builder()
                    .next_forward_token("f/3")
                    .build()
            });
        let client = mock_client!(
            aws_sdk_cloudwatchlogs,
            RuleMode::MatchAny,
            [&first, &second, &third, &last]
        );

        let events = CloudWatchLogPlatform::new(client)
            .get_stream_events("/aws/lambda/greeter", "B", 0)
            .await
            .expect("stream should be read");

        assert_eq!(
            events,
            vec![
                LogEvent::new(2, "START RequestId: abc-123\n"),
                LogEvent::new(3, "hello"),
                LogEvent::new(4, "END RequestId: abc-123\n"),
            ]
        );
        assert_eq!(last.num_calls(), 1);
    }

    #[tokio::test]
    async fn client_lists_streams_across_pages() {
        let first = mock!(Client::describe_log_streams)
            .match_requests(|req| req.next_token().is_none())
            .then_output(|| {
                DescribeLogStreamsOutput::builder()
                    .log_streams(SdkLogStream::builder().log_stream_name("A").build())
                    .next_token("t/1")
                    .build()
            });
        let second = mock!(Client::describe_log_streams)
            .match_requests(|req| req.next_token() == Some("t/1"))
            .then_output(|| {
                DescribeLogStreamsOutput::builder()
                    .log_streams(SdkLogStream::builder().log_stream_name("B").build())
                    .build()
            });
        let client = mock_client!(aws_sdk_cloudwatchlogs, RuleMode::MatchAny, [&first, &second]);

        let streams = CloudWatchLogPlatform::new(client)
            .list_streams("/aws/lambda/greeter")
            .await
            .expect("streams should be listed");

        assert_eq!(streams, vec![LogStream::new("A"), LogStream::new("B")]);
        assert_eq!(second.num_calls(), 1);
    }
}
