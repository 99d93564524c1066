// Logs module - Entry model, in-memory sinks and the rotating file writer

pub mod buffer;
mod entry;
pub mod format;
mod levels;
mod listeners;
pub mod queue;
pub mod writer;

pub use buffer::RingBuffer;
pub use entry::{now_millis, ErrorInfo, LogCategory, LogData, LogEntry, LogLevel};
pub use levels::LevelResolver;
pub use listeners::{ListenerHub, ListenerId, LogListener};
pub use queue::{AsyncFileWriter, WriterStats};
pub use writer::{backup_path, LogFileWriter, RotationPolicy};
