// Log entry model - levels, categories and the immutable entry record

use crate::error::CorelogError;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::str::FromStr;

/// Structured key/value payload attached to an entry, in insertion order
pub type LogData = serde_json::Map<String, serde_json::Value>;

/// Severity of a log entry, ordered by priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    /// All levels from lowest to highest priority
    pub const ALL: [LogLevel; 6] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Off,
    ];

    /// Numeric priority used for threshold comparison
    pub fn priority(&self) -> u8 {
        match self {
            LogLevel::Trace => 0,
            LogLevel::Debug => 1,
            LogLevel::Info => 2,
            LogLevel::Warn => 3,
            LogLevel::Error => 4,
            LogLevel::Off => 5,
        }
    }

    /// Get the display name for this level
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Off => "OFF",
        }
    }

    /// Whether an entry at this level passes the given threshold.
    ///
    /// `Off` is a threshold only: entries tagged `Off` never pass.
    pub fn passes(&self, threshold: LogLevel) -> bool {
        *self != LogLevel::Off && self.priority() >= threshold.priority()
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = CorelogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "OFF" | "NONE" => Ok(LogLevel::Off),
            _ => Err(CorelogError::InvalidLevel(s.to_string())),
        }
    }
}

/// Domain tag used for filtering and grouping entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogCategory {
    Auth,
    Network,
    Storage,
    System,
    Ui,
    Plugin,
    Performance,
    Security,
    General,
}

impl LogCategory {
    pub const ALL: [LogCategory; 9] = [
        LogCategory::Auth,
        LogCategory::Network,
        LogCategory::Storage,
        LogCategory::System,
        LogCategory::Ui,
        LogCategory::Plugin,
        LogCategory::Performance,
        LogCategory::Security,
        LogCategory::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogCategory::Auth => "AUTH",
            LogCategory::Network => "NETWORK",
            LogCategory::Storage => "STORAGE",
            LogCategory::System => "SYSTEM",
            LogCategory::Ui => "UI",
            LogCategory::Plugin => "PLUGIN",
            LogCategory::Performance => "PERFORMANCE",
            LogCategory::Security => "SECURITY",
            LogCategory::General => "GENERAL",
        }
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogCategory {
    type Err = CorelogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        LogCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| CorelogError::InvalidCategory(s.to_string()))
    }
}

/// Captured error attached to an entry: a message plus its frames
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
    #[serde(default)]
    pub frames: Vec<String>,
}

impl ErrorInfo {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            frames: Vec::new(),
        }
    }

    /// Attach explicit frames, e.g. lines of a captured backtrace
    pub fn with_frames<I, S>(mut self, frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.frames = frames.into_iter().map(Into::into).collect();
        self
    }

    /// Capture an error and its `source()` chain, one frame per cause
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut frames = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            frames.push(format!("caused by: {}", cause));
            source = cause.source();
        }
        Self {
            message: err.to_string(),
            frames,
        }
    }

    /// Capture the current thread's backtrace as frames
    pub fn with_backtrace(message: impl Into<String>) -> Self {
        let trace = std::backtrace::Backtrace::force_capture().to_string();
        Self::new(message).with_frames(
            trace
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>(),
        )
    }

    /// Copy with paths, URLs and emails scrubbed from message and frames
    pub fn sanitized(&self) -> Self {
        Self {
            message: crate::sanitize::sanitize_exception_message(&self.message),
            frames: self
                .frames
                .iter()
                .map(|f| crate::sanitize::sanitize_stack_trace(f))
                .collect(),
        }
    }
}

/// A single immutable log record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub level: LogLevel,
    pub category: LogCategory,
    /// Component that produced the entry
    pub component: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<LogData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl LogEntry {
    /// Create a new log entry stamped with the current time
    pub fn new(
        level: LogLevel,
        category: LogCategory,
        component: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: now_millis(),
            level,
            category,
            component: component.into(),
            message: message.into(),
            data: None,
            error: None,
        }
    }

    pub fn with_data(mut self, data: LogData) -> Self {
        self.data = if data.is_empty() { None } else { Some(data) };
        self
    }

    pub fn with_error(mut self, error: ErrorInfo) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }
}

thread_local! {
    static LAST_TIMESTAMP: Cell<i64> = const { Cell::new(0) };
}

/// Wall-clock epoch millis, never going backwards on the calling thread
pub fn now_millis() -> i64 {
    let now = chrono::Utc::now().timestamp_millis();
    LAST_TIMESTAMP.with(|last| {
        let ts = now.max(last.get());
        last.set(ts);
        ts
    })
}
