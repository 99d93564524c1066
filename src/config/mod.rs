use crate::error::{CorelogError, Result};
use crate::logs::buffer::DEFAULT_CAPACITY as DEFAULT_RING_BUFFER_CAPACITY;
use crate::logs::queue::DEFAULT_QUEUE_CAPACITY;
use crate::logs::writer::{
    RotationPolicy, DEFAULT_MAX_BACKUPS, DEFAULT_MAX_LOG_SIZE, DEFAULT_STACK_TRACE_DEPTH,
};
use crate::logs::{LogCategory, LogLevel};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the initial global level
pub const LEVEL_ENV_VAR: &str = "CORELOG_LEVEL";

/// Environment variable enabling development defaults
pub const DEV_MODE_ENV_VAR: &str = "CORELOG_DEV";

/// Environment variable enabling file logging at the given path
pub const FILE_ENV_VAR: &str = "CORELOG_FILE";

/// Upper bound on numbered backups
const MAX_BACKUP_LIMIT: usize = 100;

/// Logging configuration, constructed once and applied as a whole
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Threshold for categories without an override
    #[serde(default = "default_global_level")]
    pub global_level: LogLevel,

    /// Per-category thresholds
    #[serde(default)]
    pub category_levels: HashMap<LogCategory, LogLevel>,

    /// Whether entries are persisted to `log_file_path`
    #[serde(default)]
    pub file_logging_enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file_path: Option<PathBuf>,

    /// Size at which the base file is rotated
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,

    /// Number of numbered backups kept
    #[serde(default = "default_max_backup_files")]
    pub max_backup_files: usize,

    /// Frames written per error, 0 for unlimited
    #[serde(default = "default_stack_trace_depth")]
    pub stack_trace_depth: usize,

    #[serde(default = "default_ring_buffer_capacity")]
    pub ring_buffer_capacity: usize,

    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// How long shutdown waits for queued entries to reach the file
    #[serde(default = "default_drain_timeout")]
    pub drain_timeout_ms: u64,

    /// Install the Ctrl-C/SIGTERM cleanup handler on initialize.
    ///
    /// `ctrlc` allows one handler per process and this one exits with status
    /// 130 after shutting logging down. Hosts that install their own handler
    /// must set this to false and call `shutdown` themselves.
    #[serde(default = "default_register_exit_hook")]
    pub register_exit_hook: bool,
}

// Default value functions for serde
fn default_global_level() -> LogLevel {
    LogLevel::Info
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_LOG_SIZE
}

fn default_max_backup_files() -> usize {
    DEFAULT_MAX_BACKUPS
}

fn default_stack_trace_depth() -> usize {
    DEFAULT_STACK_TRACE_DEPTH
}

fn default_ring_buffer_capacity() -> usize {
    DEFAULT_RING_BUFFER_CAPACITY
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_drain_timeout() -> u64 {
    5000
}

fn default_register_exit_hook() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            global_level: default_global_level(),
            category_levels: HashMap::new(),
            file_logging_enabled: false,
            log_file_path: None,
            max_file_size_bytes: default_max_file_size(),
            max_backup_files: default_max_backup_files(),
            stack_trace_depth: default_stack_trace_depth(),
            ring_buffer_capacity: default_ring_buffer_capacity(),
            queue_capacity: default_queue_capacity(),
            drain_timeout_ms: default_drain_timeout(),
            register_exit_hook: default_register_exit_hook(),
        }
    }
}

impl LoggingConfig {
    /// Load a configuration file (supports TOML and JSON)
    pub fn from_file(path: &Path) -> Result<LoggingConfig> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CorelogError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");

        let mut config = match extension {
            "toml" => Self::parse_toml(&contents)?,
            "json" => Self::parse_json(&contents)?,
            _ => {
                return Err(CorelogError::InvalidConfig(format!(
                    "Unsupported file format: {}. Use .toml or .json",
                    extension
                )))
            }
        };

        config.expand_env_vars();
        config.validate()?;

        Ok(config)
    }

    fn parse_toml(contents: &str) -> Result<LoggingConfig> {
        toml::from_str(contents)
            .map_err(|e| CorelogError::InvalidConfig(format!("Failed to parse TOML: {}", e)))
    }

    fn parse_json(contents: &str) -> Result<LoggingConfig> {
        serde_json::from_str(contents)
            .map_err(|e| CorelogError::InvalidConfig(format!("Failed to parse JSON: {}", e)))
    }

    /// Build a configuration from the process environment.
    ///
    /// Without an explicit `CORELOG_LEVEL`, development mode (debug builds or
    /// `CORELOG_DEV`) defaults to DEBUG and everything else to INFO.
    pub fn from_env() -> Result<LoggingConfig> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `from_env` with an injectable variable source
    pub fn from_lookup<F>(lookup: F) -> Result<LoggingConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let dev_mode = cfg!(debug_assertions)
            || lookup(DEV_MODE_ENV_VAR)
                .map(|v| is_truthy(&v))
                .unwrap_or(false);

        let mut config = LoggingConfig {
            global_level: if dev_mode {
                LogLevel::Debug
            } else {
                LogLevel::Info
            },
            ..LoggingConfig::default()
        };
        config.apply_overrides(lookup)?;
        Ok(config)
    }

    /// Apply `CORELOG_LEVEL` and `CORELOG_FILE` on top of this configuration
    pub fn with_env_overrides(mut self) -> Result<LoggingConfig> {
        self.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(self)
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup(LEVEL_ENV_VAR).filter(|v| !v.trim().is_empty()) {
            self.global_level = level.parse()?;
        }
        if let Some(file) = lookup(FILE_ENV_VAR).filter(|v| !v.trim().is_empty()) {
            self.file_logging_enabled = true;
            self.log_file_path = Some(PathBuf::from(file));
            self.expand_env_vars();
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.file_logging_enabled {
            match &self.log_file_path {
                Some(path) if !path.as_os_str().is_empty() => {}
                _ => {
                    return Err(CorelogError::ConfigValidationError(
                        "log_file_path is required when file logging is enabled".to_string(),
                    ))
                }
            }
        }

        if self.max_file_size_bytes == 0 {
            return Err(CorelogError::ConfigValidationError(
                "max_file_size_bytes must be at least 1".to_string(),
            ));
        }

        if self.max_backup_files > MAX_BACKUP_LIMIT {
            return Err(CorelogError::ConfigValidationError(format!(
                "max_backup_files cannot exceed {}",
                MAX_BACKUP_LIMIT
            )));
        }

        if self.ring_buffer_capacity == 0 {
            return Err(CorelogError::ConfigValidationError(
                "ring_buffer_capacity must be at least 1".to_string(),
            ));
        }

        if self.queue_capacity == 0 {
            return Err(CorelogError::ConfigValidationError(
                "queue_capacity must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Expand `~` and environment variables in the log file path
    fn expand_env_vars(&mut self) {
        if let Some(ref path) = self.log_file_path {
            self.log_file_path = Some(Self::expand_env_in_path(path));
        }
    }

    /// Expand environment variables in a string
    fn expand_env_in_string(s: &str) -> String {
        let mut result = s.to_string();

        if let Some(rest) = result.strip_prefix("~/") {
            if let Some(home) = std::env::var_os("HOME") {
                result = format!("{}/{}", home.to_string_lossy(), rest);
            }
        }

        // Handle $VAR and ${VAR} syntax
        for (key, value) in std::env::vars() {
            result = result.replace(&format!("${{{}}}", key), &value);
            result = result.replace(&format!("${}", key), &value);
        }

        result
    }

    fn expand_env_in_path(path: &Path) -> PathBuf {
        let path_str = path.to_string_lossy();
        PathBuf::from(Self::expand_env_in_string(&path_str))
    }

    /// Rotation settings handed to the file writer
    pub fn rotation_policy(&self) -> RotationPolicy {
        RotationPolicy {
            max_file_size_bytes: self.max_file_size_bytes,
            max_backup_files: self.max_backup_files,
            stack_trace_depth: self.stack_trace_depth,
        }
    }

    /// Get drain timeout as Duration
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CorelogError::SerializationError(format!("Failed to render TOML: {}", e)))
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_logging_config_defaults() {
        let config = LoggingConfig::default();

        assert_eq!(config.global_level, LogLevel::Info);
        assert_eq!(config.max_file_size_bytes, 10 * 1024 * 1024);
        assert_eq!(config.max_backup_files, 5);
        assert_eq!(config.stack_trace_depth, 10);
        assert_eq!(config.ring_buffer_capacity, 1000);
        assert_eq!(config.drain_timeout(), Duration::from_secs(5));
        assert!(!config.file_logging_enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_file_logging_requires_path() {
        let config = LoggingConfig {
            file_logging_enabled: true,
            ..LoggingConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(CorelogError::ConfigValidationError(_))
        ));
    }

    #[test]
    fn test_validate_zero_capacities() {
        let config = LoggingConfig {
            queue_capacity: 0,
            ..LoggingConfig::default()
        };
        assert!(config.validate().is_err());

        let config = LoggingConfig {
            ring_buffer_capacity: 0,
            ..LoggingConfig::default()
        };
        assert!(config.validate().is_err());

        let config = LoggingConfig {
            max_file_size_bytes: 0,
            ..LoggingConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_too_many_backups() {
        let config = LoggingConfig {
            max_backup_files: 101,
            ..LoggingConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_toml() {
        let toml_content = r#"
            global_level = "WARN"
            file_logging_enabled = true
            log_file_path = "/tmp/app.log"
            max_backup_files = 2

            [category_levels]
            AUTH = "DEBUG"
            NETWORK = "ERROR"
        "#;

        let config = LoggingConfig::parse_toml(toml_content).unwrap();
        assert_eq!(config.global_level, LogLevel::Warn);
        assert_eq!(config.max_backup_files, 2);
        assert_eq!(config.max_file_size_bytes, DEFAULT_MAX_LOG_SIZE);
        assert_eq!(
            config.category_levels.get(&LogCategory::Auth),
            Some(&LogLevel::Debug)
        );
        assert_eq!(
            config.category_levels.get(&LogCategory::Network),
            Some(&LogLevel::Error)
        );
    }

    #[test]
    fn test_parse_json() {
        let json_content = r#"
            {
                "global_level": "TRACE",
                "stack_trace_depth": 0,
                "category_levels": { "UI": "WARN" }
            }
        "#;

        let config = LoggingConfig::parse_json(json_content).unwrap();
        assert_eq!(config.global_level, LogLevel::Trace);
        assert_eq!(config.stack_trace_depth, 0);
        assert_eq!(config.category_levels.get(&LogCategory::Ui), Some(&LogLevel::Warn));
    }

    #[test]
    fn test_parse_invalid_level() {
        let result = LoggingConfig::parse_toml(r#"global_level = "LOUD""#);
        assert!(matches!(result, Err(CorelogError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_file_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("logging.toml");

        fs::write(&config_path, "global_level = \"ERROR\"\n").unwrap();

        let config = LoggingConfig::from_file(&config_path).unwrap();
        assert_eq!(config.global_level, LogLevel::Error);
    }

    #[test]
    fn test_from_file_unsupported_format() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("logging.yaml");

        fs::write(&config_path, "global_level: INFO").unwrap();

        let result = LoggingConfig::from_file(&config_path);
        assert!(matches!(result, Err(CorelogError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_lookup_explicit_level() {
        let config = LoggingConfig::from_lookup(lookup_from(&[(LEVEL_ENV_VAR, "warn")])).unwrap();
        assert_eq!(config.global_level, LogLevel::Warn);
    }

    #[test]
    fn test_from_lookup_dev_mode_fallback() {
        let config = LoggingConfig::from_lookup(lookup_from(&[(DEV_MODE_ENV_VAR, "true")])).unwrap();
        assert_eq!(config.global_level, LogLevel::Debug);

        let config = LoggingConfig::from_lookup(lookup_from(&[])).unwrap();
        let expected = if cfg!(debug_assertions) {
            LogLevel::Debug
        } else {
            LogLevel::Info
        };
        assert_eq!(config.global_level, expected);
    }

    #[test]
    fn test_from_lookup_file_path() {
        let config =
            LoggingConfig::from_lookup(lookup_from(&[(FILE_ENV_VAR, "/tmp/corelog-test.log")]))
                .unwrap();
        assert!(config.file_logging_enabled);
        assert_eq!(config.log_file_path, Some(PathBuf::from("/tmp/corelog-test.log")));
    }

    #[test]
    fn test_from_lookup_invalid_level() {
        let result = LoggingConfig::from_lookup(lookup_from(&[(LEVEL_ENV_VAR, "chatty")]));
        assert!(matches!(result, Err(CorelogError::InvalidLevel(_))));
    }

    #[test]
    fn test_toml_round_trip_of_overrides() {
        let mut config = LoggingConfig::default();
        config.category_levels.insert(LogCategory::Security, LogLevel::Trace);
        config.log_file_path = Some(PathBuf::from("/tmp/a.log"));

        let rendered = config.to_toml().unwrap();
        let parsed = LoggingConfig::parse_toml(&rendered).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("CORELOG_TEST_DIR", "/tmp/corelog");

        let mut config = LoggingConfig {
            log_file_path: Some(PathBuf::from("${CORELOG_TEST_DIR}/app.log")),
            ..LoggingConfig::default()
        };
        config.expand_env_vars();

        assert_eq!(config.log_file_path, Some(PathBuf::from("/tmp/corelog/app.log")));
    }
}
