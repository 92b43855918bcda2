//! Terminal rendering of event payloads and collected invocation logs.

use std::io::{self, Write};

use chrono::{SecondsFormat, TimeZone, Utc};
use lambda_watch_core::LogEvent;

const DIVIDER_WIDTH: usize = 80;

fn divider(ch: char) -> String {
    ch.to_string().repeat(DIVIDER_WIDTH)
}

pub fn display_title(out: &mut impl Write, title: &str) -> io::Result<()> {
    writeln!(out, "{}", divider('='))?;
    writeln!(out, "{title}")?;
    writeln!(out, "{}", divider('-'))
}

pub fn display_block(out: &mut impl Write, title: &str, content: &str) -> io::Result<()> {
    display_title(out, title)?;
    writeln!(out, "{content}")?;
    writeln!(out, "{}", divider('='))
}

/// `<UTC timestamp>: <message>`, with the message's trailing newline removed.
pub fn format_event_line(event: &LogEvent) -> String {
    let timestamp = Utc
        .timestamp_millis_opt(event.timestamp)
        .single()
        .map(|time| time.to_rfc3339_opts(SecondsFormat::Secs, false))
        .unwrap_or_else(|| event.timestamp.to_string());
    format!("{timestamp}: {}", event.message.trim_end_matches(['\r', '\n']))
}

pub fn display_events(out: &mut impl Write, events: &[LogEvent]) -> io::Result<()> {
    let separator = divider('-');
    writeln!(out, "\n{separator}\n")?;
    for event in events {
        writeln!(out, "{}", format_event_line(event))?;
    }
    writeln!(out, "\n{separator}\n")
}
