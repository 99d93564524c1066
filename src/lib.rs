// Library exports for corelog

pub mod cli;
pub mod config;
pub mod error;
pub mod fallback;
pub mod global;
pub mod logs;
pub mod sanitize;
pub mod system;

pub use config::LoggingConfig;
pub use error::{CorelogError, Result};
pub use global::{initialize, logger, shutdown, system};
pub use logs::{ErrorInfo, ListenerId, LogCategory, LogData, LogEntry, LogLevel, LogListener};
pub use system::{ComponentLogger, LifecycleState, LoggingSystem};
