// Level resolver - global threshold plus per-category overrides

use crate::logs::entry::{LogCategory, LogLevel};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug)]
struct LevelState {
    global: LogLevel,
    overrides: HashMap<LogCategory, LogLevel>,
}

/// Holds the severity thresholds consulted on every log call
///
/// Every access takes one short lock; nothing else ever runs while it is held.
#[derive(Debug)]
pub struct LevelResolver {
    state: Mutex<LevelState>,
}

impl LevelResolver {
    pub fn new(global: LogLevel) -> Self {
        Self {
            state: Mutex::new(LevelState {
                global,
                overrides: HashMap::new(),
            }),
        }
    }

    pub fn set_global_level(&self, level: LogLevel) {
        if let Ok(mut state) = self.state.lock() {
            state.global = level;
        }
    }

    pub fn global_level(&self) -> LogLevel {
        self.state
            .lock()
            .map(|s| s.global)
            .unwrap_or(LogLevel::Info)
    }

    pub fn set_category_level(&self, category: LogCategory, level: LogLevel) {
        if let Ok(mut state) = self.state.lock() {
            state.overrides.insert(category, level);
        }
    }

    pub fn clear_category_level(&self, category: LogCategory) {
        if let Ok(mut state) = self.state.lock() {
            state.overrides.remove(&category);
        }
    }

    /// Category override if present, else the global level
    pub fn effective_level(&self, category: LogCategory) -> LogLevel {
        self.state
            .lock()
            .map(|s| s.overrides.get(&category).copied().unwrap_or(s.global))
            .unwrap_or(LogLevel::Info)
    }

    /// Whether an entry of `level` in `category` should be accepted
    pub fn is_enabled(&self, level: LogLevel, category: LogCategory) -> bool {
        level.passes(self.effective_level(category))
    }

    /// Snapshot of the current overrides
    pub fn category_overrides(&self) -> HashMap<LogCategory, LogLevel> {
        self.state
            .lock()
            .map(|s| s.overrides.clone())
            .unwrap_or_default()
    }

    /// Replace the global level and every override in one step
    pub fn apply(&self, global: LogLevel, overrides: &HashMap<LogCategory, LogLevel>) {
        if let Ok(mut state) = self.state.lock() {
            state.global = global;
            state.overrides = overrides.clone();
        }
    }
}

impl Default for LevelResolver {
    fn default() -> Self {
        Self::new(LogLevel::Info)
    }
}
