// Integration test for per-category level filtering across every sink

use corelog::{LogCategory, LogEntry, LogLevel, LoggingConfig, LoggingSystem};
use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn config_with_auth_override(path: &std::path::Path) -> LoggingConfig {
    let mut category_levels = HashMap::new();
    category_levels.insert(LogCategory::Auth, LogLevel::Warn);

    LoggingConfig {
        global_level: LogLevel::Debug,
        category_levels,
        file_logging_enabled: true,
        log_file_path: Some(path.to_path_buf()),
        register_exit_hook: false,
        ..LoggingConfig::default()
    }
}

#[test]
fn test_category_override_applies_to_all_sinks() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("app.log");
    let config = config_with_auth_override(&log_path);

    let system = LoggingSystem::new(config.clone());
    system.initialize();
    system.configure(config).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    system.subscribe(Arc::new(move |entry: &LogEntry| {
        sink.lock().unwrap().push(entry.message.clone());
    }));

    let auth = system.logger("SessionStore", LogCategory::Auth);
    let network = system.logger("HttpClient", LogCategory::Network);

    auth.info("token refreshed");
    auth.warn("token near expiry");
    network.debug("GET /status");
    network.trace("socket readable");

    system.shutdown();

    let expected = vec!["token near expiry".to_string(), "GET /status".to_string()];

    let buffered: Vec<String> = system
        .query(100, None, LogLevel::Trace)
        .iter()
        .map(|e| e.message.clone())
        .collect();
    assert_eq!(buffered, expected);
    assert_eq!(*seen.lock().unwrap(), expected);

    let content = fs::read_to_string(&log_path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("[WARN ] [AUTH] SessionStore: token near expiry"));
    assert!(lines[1].contains("[DEBUG] [NETWORK] HttpClient: GET /status"));
}

#[test]
fn test_effective_level_and_runtime_changes() {
    let system = LoggingSystem::new(LoggingConfig {
        register_exit_hook: false,
        ..LoggingConfig::default()
    });
    system.initialize();

    assert_eq!(system.effective_level(LogCategory::Storage), LogLevel::Info);
    system.set_category_level(LogCategory::Storage, LogLevel::Trace);
    assert_eq!(system.effective_level(LogCategory::Storage), LogLevel::Trace);
    assert!(system.is_enabled(LogLevel::Trace, LogCategory::Storage));
    assert!(!system.is_enabled(LogLevel::Trace, LogCategory::Ui));

    system.set_global_level(LogLevel::Off);
    assert!(!system.is_enabled(LogLevel::Error, LogCategory::Ui));
    assert!(system.is_enabled(LogLevel::Debug, LogCategory::Storage));

    system.clear_category_level(LogCategory::Storage);
    assert_eq!(system.effective_level(LogCategory::Storage), LogLevel::Off);
}

#[test]
fn test_query_filters_by_category_and_level() {
    let system = LoggingSystem::new(LoggingConfig {
        global_level: LogLevel::Trace,
        register_exit_hook: false,
        ..LoggingConfig::default()
    });

    let ui = system.logger("Toolbar", LogCategory::Ui);
    let plugin = system.logger("Loader", LogCategory::Plugin);
    for i in 0..5 {
        ui.debug(format!("ui debug {}", i));
        plugin.error(format!("plugin error {}", i));
    }

    let errors = system.query(3, None, LogLevel::Error);
    let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["plugin error 2", "plugin error 3", "plugin error 4"]);

    let ui_only = system.query(100, Some(LogCategory::Ui), LogLevel::Trace);
    assert_eq!(ui_only.len(), 5);
    assert!(ui_only.iter().all(|e| e.category == LogCategory::Ui));

    system.clear_buffer();
    assert!(system.query(100, None, LogLevel::Trace).is_empty());
}
