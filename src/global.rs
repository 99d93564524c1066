// Process-wide logging system

use crate::config::LoggingConfig;
use crate::error::Result;
use crate::fallback;
use crate::logs::LogCategory;
use crate::system::{ComponentLogger, LoggingSystem};
use std::sync::{Arc, LazyLock};

static GLOBAL: LazyLock<Arc<LoggingSystem>> = LazyLock::new(|| {
    let config = LoggingConfig::from_env().unwrap_or_else(|e| {
        fallback::report_error("ignoring logging environment", &e);
        LoggingConfig::default()
    });
    LoggingSystem::new(config)
});

/// The shared system; usable before `initialize` with environment defaults
pub fn system() -> Arc<LoggingSystem> {
    Arc::clone(&GLOBAL)
}

/// Initialize and configure the shared system in one step
pub fn initialize(config: LoggingConfig) -> Result<()> {
    GLOBAL.start(config)
}

pub fn shutdown() {
    GLOBAL.shutdown();
}

/// Logger on the shared system
pub fn logger(component: impl Into<String>, category: LogCategory) -> ComponentLogger {
    GLOBAL.logger(component, category)
}
