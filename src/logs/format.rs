// Line format for the log file
//
// The layout is consumed by external tailing tools and must stay stable:
//
//   <timestamp> [<LEVEL>] [<CATEGORY>] <component>: <message>[ | <data>]
//     Exception: <error message>
//       at <frame>
//       ... <N> more frames

use crate::logs::entry::{ErrorInfo, LogData, LogEntry};
use chrono::{Local, TimeZone};
use std::fmt::Write;

/// Timestamp layout used in the log file
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Render an epoch-millis timestamp in local time
pub fn format_timestamp(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis).single() {
        Some(dt) => dt.format(TIMESTAMP_FORMAT).to_string(),
        None => millis.to_string(),
    }
}

/// Render a data map as `{key=value, key2=value2}`
pub fn format_data(data: &LogData) -> String {
    let mut out = String::from("{");
    for (i, (key, value)) in data.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(key);
        out.push('=');
        match value {
            serde_json::Value::String(s) => out.push_str(s),
            other => out.push_str(&other.to_string()),
        }
    }
    out.push('}');
    out
}

/// Format a complete entry, newline-terminated.
///
/// # Arguments
/// * `entry` - Entry to render
/// * `stack_trace_depth` - Maximum frames written per error, 0 for all
pub fn format_entry(entry: &LogEntry, stack_trace_depth: usize) -> String {
    let mut line = String::with_capacity(96 + entry.message.len());
    let _ = write!(
        line,
        "{} [{:<5}] [{}] {}: {}",
        format_timestamp(entry.timestamp),
        entry.level.as_str(),
        entry.category.as_str(),
        entry.component,
        entry.message
    );

    if let Some(data) = entry.data.as_ref().filter(|d| !d.is_empty()) {
        line.push_str(" | ");
        line.push_str(&format_data(data));
    }
    line.push('\n');

    if let Some(error) = &entry.error {
        format_error(&mut line, error, stack_trace_depth);
    }

    line
}

fn format_error(out: &mut String, error: &ErrorInfo, stack_trace_depth: usize) {
    let _ = writeln!(out, "  Exception: {}", error.message);

    let shown = if stack_trace_depth == 0 {
        error.frames.len()
    } else {
        stack_trace_depth.min(error.frames.len())
    };

    for frame in &error.frames[..shown] {
        let _ = writeln!(out, "    at {}", frame);
    }

    let remaining = error.frames.len() - shown;
    if remaining > 0 {
        let _ = writeln!(out, "    ... {} more frames", remaining);
    }
}
