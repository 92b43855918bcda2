//! Recognition of the platform's fixed-format invocation marker lines.
//!
//! Matching is exact equality against the whole message, trailing newline
//! included. A platform that changes a single byte of the format makes both
//! predicates return false for every event.

use crate::events::LogEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerFilter {
    start_marker: String,
    end_marker: String,
}

impl MarkerFilter {
    pub fn new(request_id: &str) -> Self {
        Self {
            start_marker: format!("START RequestId: {request_id}\n"),
            end_marker: format!("END RequestId: {request_id}\n"),
        }
    }

    pub fn is_start(&self, event: &LogEvent) -> bool {
        event.message == self.start_marker
    }

    pub fn is_end(&self, event: &LogEvent) -> bool {
        event.message == self.end_marker
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(message: &str) -> LogEvent {
        LogEvent::new(0, message)
    }

    #[test]
    fn matches_exact_marker_lines() {
        let filter = MarkerFilter::new("abc-123");

        assert!(filter.is_start(&event("START RequestId: abc-123\n")));
        assert!(filter.is_end(&event("END RequestId: abc-123\n")));
        assert!(!filter.is_start(&event("END RequestId: abc-123\n")));
        assert!(!filter.is_end(&event("START RequestId: abc-123\n")));
    }

    #[test]
    fn rejects_missing_trailing_newline() {
        let filter = MarkerFilter::new("abc-123");

        assert!(!filter.is_start(&event("START RequestId: abc-123")));
        assert!(!filter.is_end(&event("END RequestId: abc-123")));
    }

    #[test]
    fn rejects_prefix_and_substring_matches() {
        let filter = MarkerFilter::new("abc");

        assert!(!filter.is_start(&event("START RequestId: abc-123\n")));
        assert!(!filter.is_start(&event("  START RequestId: abc\n")));
        assert!(!filter.is_end(&event("END RequestId: abc\n extra")));
        assert!(!filter.is_end(&event(
            "END RequestId: abc\n\tVersion: $LATEST\n"
        )));
    }

    #[test]
    fn rejects_other_request_ids() {
        let filter = MarkerFilter::new("abc-123");

        assert!(!filter.is_start(&event("START RequestId: abc-124\n")));
        assert!(!filter.is_end(&event("END RequestId: ABC-123\n")));
    }
}
