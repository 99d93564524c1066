// Integration test for lifecycle, shutdown and listener behavior

use corelog::{
    CorelogError, LifecycleState, LogCategory, LogEntry, LogLevel, LoggingConfig, LoggingSystem,
};
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

fn quiet_config() -> LoggingConfig {
    LoggingConfig {
        register_exit_hook: false,
        ..LoggingConfig::default()
    }
}

#[test]
fn test_state_sequence() {
    let system = LoggingSystem::new(quiet_config());
    let mut states = vec![system.state()];

    system.initialize();
    states.push(system.state());
    system.configure(quiet_config()).unwrap();
    states.push(system.state());
    system.shutdown();
    states.push(system.state());

    assert_eq!(
        states,
        vec![
            LifecycleState::Uninitialized,
            LifecycleState::Initialized,
            LifecycleState::Active,
            LifecycleState::ShutDown,
        ]
    );
}

#[test]
fn test_shutdown_is_idempotent_and_final() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("final.log");
    let config = LoggingConfig {
        file_logging_enabled: true,
        log_file_path: Some(log_path.clone()),
        ..quiet_config()
    };

    let system = LoggingSystem::new(config.clone());
    system.initialize();
    system.configure(config).unwrap();

    let logger = system.logger("app", LogCategory::System);
    logger.info("before shutdown");

    system.shutdown();
    system.shutdown();
    logger.info("after shutdown");

    assert!(!system.is_file_logging_enabled());
    assert!(matches!(
        system.enable_file_logging(&log_path),
        Err(CorelogError::InvalidState(_))
    ));

    let content = fs::read_to_string(&log_path).unwrap();
    assert!(content.contains("before shutdown"));
    assert!(!content.contains("after shutdown"));
    assert_eq!(system.query(10, None, LogLevel::Trace).len(), 2);
}

#[test]
fn test_concurrent_shutdown_calls() {
    let system = LoggingSystem::new(quiet_config());
    system.initialize();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let system = Arc::clone(&system);
            std::thread::spawn(move || system.shutdown())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(system.state().is_terminal());
}

fn explode(_: &LogEntry) {
    panic!("listener failure");
}

#[test]
fn test_panicking_listener_is_isolated() {
    let system = LoggingSystem::new(quiet_config());
    let delivered = Arc::new(AtomicUsize::new(0));

    system.subscribe(Arc::new(explode));
    let counter = Arc::clone(&delivered);
    system.subscribe(Arc::new(move |_: &LogEntry| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    let logger = system.logger("ui", LogCategory::Ui);
    logger.info("first");
    logger.warn("second");

    assert_eq!(delivered.load(Ordering::SeqCst), 2);
    assert_eq!(system.query(10, None, LogLevel::Trace).len(), 2);
}

#[test]
fn test_unsubscribe_stops_delivery() {
    let system = LoggingSystem::new(quiet_config());
    let delivered = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&delivered);
    let id = system.subscribe(Arc::new(move |_: &LogEntry| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    let logger = system.logger("ui", LogCategory::Ui);
    logger.info("seen");
    assert!(system.unsubscribe(id));
    assert!(!system.unsubscribe(id));
    logger.info("unseen");

    assert_eq!(delivered.load(Ordering::SeqCst), 1);
    assert_eq!(system.listener_count(), 0);
}

#[test]
fn test_unopenable_file_leaves_memory_logging_working() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("not-a-dir");
    fs::write(&blocker, "plain file").unwrap();

    let system = LoggingSystem::new(quiet_config());
    system.initialize();
    system.configure(quiet_config()).unwrap();

    assert!(system.enable_file_logging(&blocker.join("app.log")).is_err());
    assert!(!system.is_file_logging_enabled());

    system.logger("app", LogCategory::Storage).error("still buffered");
    assert_eq!(system.query(10, None, LogLevel::Error).len(), 1);
}

#[test]
fn test_switching_file_paths() {
    let temp_dir = TempDir::new().unwrap();
    let first = temp_dir.path().join("first.log");
    let second = temp_dir.path().join("second.log");

    let system = LoggingSystem::new(quiet_config());
    system.initialize();
    system.configure(quiet_config()).unwrap();
    let logger = system.logger("app", LogCategory::General);

    system.enable_file_logging(&first).unwrap();
    logger.info("one");
    system.enable_file_logging(&second).unwrap();
    logger.info("two");
    system.shutdown();

    assert!(fs::read_to_string(&first).unwrap().contains("one"));
    let second_content = fs::read_to_string(&second).unwrap();
    assert!(second_content.contains("two"));
    assert!(!second_content.contains("one"));
    assert_eq!(system.written_count(), 2);
}

#[test]
fn test_error_block_is_written() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("errors.log");
    let config = LoggingConfig {
        file_logging_enabled: true,
        log_file_path: Some(log_path.clone()),
        stack_trace_depth: 2,
        ..quiet_config()
    };
    let system = LoggingSystem::new(config.clone());
    system.initialize();
    system.configure(config).unwrap();

    let error = corelog::ErrorInfo::new("disk full").with_frames(["a", "b", "c", "d"]);
    system
        .logger("store", LogCategory::Storage)
        .log(LogLevel::Error, "save failed", None, Some(error));
    system.shutdown();

    let content = fs::read_to_string(&log_path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert!(lines[0].ends_with("[ERROR] [STORAGE] store: save failed"));
    assert_eq!(lines[1], "  Exception: disk full");
    assert_eq!(lines[2], "    at a");
    assert_eq!(lines[3], "    at b");
    assert_eq!(lines[4], "    ... 2 more frames");
    assert_eq!(lines.len(), 5);
}
