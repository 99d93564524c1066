// Logging system - lifecycle, pipeline dispatch and per-component loggers

use crate::config::LoggingConfig;
use crate::error::{CorelogError, Result};
use crate::fallback;
use crate::logs::{
    AsyncFileWriter, ErrorInfo, LevelResolver, ListenerHub, ListenerId, LogCategory, LogData,
    LogEntry, LogLevel, LogListener, RingBuffer, WriterStats,
};
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, Once, RwLock, Weak};

/// Lifecycle of a `LoggingSystem`; `ShutDown` is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecycleState {
    Uninitialized = 0,
    Initialized = 1,
    Active = 2,
    ShuttingDown = 3,
    ShutDown = 4,
}

impl LifecycleState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LifecycleState::Uninitialized,
            1 => LifecycleState::Initialized,
            2 => LifecycleState::Active,
            3 => LifecycleState::ShuttingDown,
            _ => LifecycleState::ShutDown,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleState::ShuttingDown | LifecycleState::ShutDown)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleState::Uninitialized => "UNINITIALIZED",
            LifecycleState::Initialized => "INITIALIZED",
            LifecycleState::Active => "ACTIVE",
            LifecycleState::ShuttingDown => "SHUTTING_DOWN",
            LifecycleState::ShutDown => "SHUT_DOWN",
        };
        f.write_str(s)
    }
}

/// The logging pipeline: level filter, ring buffer, listeners and file writer
///
/// Log calls are accepted in every state. Before `configure` and after
/// `shutdown` only the in-memory paths receive entries.
pub struct LoggingSystem {
    state: AtomicU8,
    config: RwLock<LoggingConfig>,
    levels: LevelResolver,
    buffer: RingBuffer,
    listeners: ListenerHub,
    file: RwLock<Option<Arc<AsyncFileWriter>>>,
    file_fault: Arc<AtomicBool>,
    writer_stats: Arc<WriterStats>,
    /// Serializes enable/disable/shutdown; never taken on the log path
    transition: Mutex<()>,
}

impl LoggingSystem {
    /// Create an uninitialized system.
    ///
    /// Levels come from `config` right away; the ring buffer capacity is fixed
    /// here for the life of the system.
    pub fn new(config: LoggingConfig) -> Arc<Self> {
        let levels = LevelResolver::new(config.global_level);
        levels.apply(config.global_level, &config.category_levels);

        Arc::new(Self {
            state: AtomicU8::new(LifecycleState::Uninitialized as u8),
            buffer: RingBuffer::new(config.ring_buffer_capacity),
            levels,
            listeners: ListenerHub::new(),
            file: RwLock::new(None),
            file_fault: Arc::new(AtomicBool::new(false)),
            writer_stats: Arc::new(WriterStats::default()),
            transition: Mutex::new(()),
            config: RwLock::new(config),
        })
    }

    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Register process-exit cleanup and move to `Initialized`.
    ///
    /// Only the first call has any effect. With `register_exit_hook` set this
    /// installs the process's single `ctrlc` handler, which exits with status
    /// 130; hosts that need their own handler must disable it.
    pub fn initialize(self: &Arc<Self>) {
        if self
            .state
            .compare_exchange(
                LifecycleState::Uninitialized as u8,
                LifecycleState::Initialized as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            return;
        }

        let register = self
            .config
            .read()
            .map(|c| c.register_exit_hook)
            .unwrap_or(false);
        if register {
            register_exit_hook(self);
        }
        tracing::debug!("logging system initialized");
    }

    /// Apply a configuration and move to `Active`.
    ///
    /// Replaces all level thresholds and enables or disables the file writer
    /// to match. Fails if the system is not initialized or already shut down.
    pub fn configure(&self, config: LoggingConfig) -> Result<()> {
        config.validate()?;

        let state = self.state();
        if state == LifecycleState::Uninitialized || state.is_terminal() {
            return Err(CorelogError::InvalidState(format!(
                "cannot configure while {}",
                state
            )));
        }

        self.levels
            .apply(config.global_level, &config.category_levels);

        let file_target = if config.file_logging_enabled {
            config.log_file_path.clone()
        } else {
            None
        };

        if let Ok(mut current) = self.config.write() {
            *current = config;
        }

        let _ = self.state.compare_exchange(
            LifecycleState::Initialized as u8,
            LifecycleState::Active as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );

        match file_target {
            Some(path) => self.enable_file_logging(&path),
            None => {
                self.disable_file_logging();
                Ok(())
            }
        }
    }

    /// `initialize` then `configure`, taking the exit hook choice from `config`
    pub fn start(self: &Arc<Self>, config: LoggingConfig) -> Result<()> {
        config.validate()?;
        if self.state() == LifecycleState::Uninitialized {
            if let Ok(mut current) = self.config.write() {
                current.register_exit_hook = config.register_exit_hook;
            }
        }
        self.initialize();
        self.configure(config)
    }

    /// Snapshot of the configuration last applied
    pub fn config(&self) -> LoggingConfig {
        self.config
            .read()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    /// Create a logger bound to a component and category
    pub fn logger(
        self: &Arc<Self>,
        component: impl Into<String>,
        category: LogCategory,
    ) -> ComponentLogger {
        ComponentLogger {
            system: Arc::clone(self),
            component: Arc::from(component.into()),
            category,
        }
    }

    /// Submit a prepared entry; returns whether it passed the level filter
    pub fn log_entry(&self, entry: LogEntry) -> bool {
        if !self.levels.is_enabled(entry.level, entry.category) {
            return false;
        }
        self.dispatch(entry);
        true
    }

    /// Run an accepted entry through buffer, listeners and file queue
    fn dispatch(&self, entry: LogEntry) {
        let entry = Arc::new(entry);
        self.buffer.record(Arc::clone(&entry));
        self.listeners.notify(&entry);

        if let Ok(slot) = self.file.read() {
            if let Some(writer) = slot.as_ref() {
                writer.enqueue(entry);
            }
        }
    }

    pub fn is_enabled(&self, level: LogLevel, category: LogCategory) -> bool {
        self.levels.is_enabled(level, category)
    }

    // Level resolver surface

    pub fn set_global_level(&self, level: LogLevel) {
        self.levels.set_global_level(level);
    }

    pub fn set_category_level(&self, category: LogCategory, level: LogLevel) {
        self.levels.set_category_level(category, level);
    }

    pub fn clear_category_level(&self, category: LogCategory) {
        self.levels.clear_category_level(category);
    }

    pub fn effective_level(&self, category: LogCategory) -> LogLevel {
        self.levels.effective_level(category)
    }

    pub fn levels(&self) -> &LevelResolver {
        &self.levels
    }

    // Ring buffer surface

    /// Most recent matching entries, oldest to newest
    pub fn query(
        &self,
        limit: usize,
        category: Option<LogCategory>,
        min_level: LogLevel,
    ) -> Vec<Arc<LogEntry>> {
        self.buffer.query(limit, category, min_level)
    }

    pub fn clear_buffer(&self) {
        self.buffer.clear();
    }

    pub fn buffer(&self) -> &RingBuffer {
        &self.buffer
    }

    // Listener surface

    pub fn subscribe(&self, listener: Arc<dyn LogListener>) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // File writer surface

    /// Start writing to `path`.
    ///
    /// A no-op if a writer with the current rotation settings is already
    /// running on the same path, or a permission failure disabled file
    /// logging. Any other running writer is drained and replaced. Refused
    /// after shutdown.
    pub fn enable_file_logging(&self, path: &Path) -> Result<()> {
        let _guard = self.transition.lock();

        if self.state().is_terminal() {
            return Err(CorelogError::InvalidState(
                "file logging cannot be enabled after shutdown".to_string(),
            ));
        }
        if self.is_file_logging_faulted() {
            return Ok(());
        }

        let config = self.config();
        let existing = self.file.read().ok().and_then(|slot| slot.clone());
        if let Some(writer) = existing {
            let unchanged = writer.path() == path
                && writer.policy() == config.rotation_policy()
                && writer.capacity() == config.queue_capacity.max(1);
            if writer.is_running() && unchanged {
                return Ok(());
            }
            self.stop_writer();
        }

        let writer = AsyncFileWriter::start(
            path,
            config.rotation_policy(),
            config.queue_capacity,
            Arc::clone(&self.writer_stats),
            Arc::clone(&self.file_fault),
        )
        .inspect_err(|e| fallback::report_error("failed to enable file logging", e))?;

        if let Ok(mut slot) = self.file.write() {
            *slot = Some(Arc::new(writer));
        }
        tracing::info!(path = %path.display(), "file logging enabled");
        Ok(())
    }

    /// Drain and stop the file writer; harmless when already disabled
    pub fn disable_file_logging(&self) {
        let _guard = self.transition.lock();
        self.stop_writer();
    }

    /// Detach the writer under the slot lock, then drain it outside it
    fn stop_writer(&self) -> u64 {
        let writer = self.file.write().ok().and_then(|mut slot| slot.take());
        match writer {
            Some(writer) => writer.stop(self.config().drain_timeout()),
            None => 0,
        }
    }

    pub fn is_file_logging_enabled(&self) -> bool {
        self.file
            .read()
            .ok()
            .and_then(|slot| slot.as_ref().map(|w| w.is_running()))
            .unwrap_or(false)
    }

    /// Whether a permission failure disabled file logging for good
    pub fn is_file_logging_faulted(&self) -> bool {
        self.file_fault.load(Ordering::SeqCst)
    }

    /// Entries lost to overflow, file errors or an expired drain
    pub fn dropped_count(&self) -> u64 {
        self.writer_stats.dropped()
    }

    pub fn written_count(&self) -> u64 {
        self.writer_stats.written()
    }

    /// Drain the file queue within the configured timeout and stop for good.
    ///
    /// Idempotent: only the first call drains or reports anything.
    pub fn shutdown(&self) {
        loop {
            let current = self.state();
            if current.is_terminal() {
                return;
            }
            if self
                .state
                .compare_exchange(
                    current as u8,
                    LifecycleState::ShuttingDown as u8,
                    Ordering::SeqCst,
                    Ordering::SeqCst,
                )
                .is_ok()
            {
                break;
            }
        }

        {
            let _guard = self.transition.lock();
            self.stop_writer();
        }

        let dropped = self.dropped_count();
        if dropped > 0 {
            fallback::report_warning(&format!(
                "logging shut down, {} log entries were dropped in total",
                dropped
            ));
        }

        self.state
            .store(LifecycleState::ShutDown as u8, Ordering::SeqCst);
        tracing::debug!(written = self.written_count(), dropped, "logging system shut down");
    }
}

static EXIT_HOOK: Once = Once::new();
static EXIT_TARGETS: Mutex<Vec<Weak<LoggingSystem>>> = Mutex::new(Vec::new());

/// Remember `system` for exit cleanup and install the signal handler once
fn register_exit_hook(system: &Arc<LoggingSystem>) {
    if let Ok(mut targets) = EXIT_TARGETS.lock() {
        targets.retain(|t| t.strong_count() > 0);
        targets.push(Arc::downgrade(system));
    }

    EXIT_HOOK.call_once(|| {
        let installed = ctrlc::set_handler(|| {
            run_exit_cleanup();
            std::process::exit(130);
        });
        if let Err(e) = installed {
            fallback::report_error("failed to install exit handler", &e);
        }
    });
}

/// Shut down every system registered for exit cleanup
pub fn run_exit_cleanup() {
    let targets: Vec<Arc<LoggingSystem>> = match EXIT_TARGETS.lock() {
        Ok(targets) => targets.iter().filter_map(Weak::upgrade).collect(),
        Err(_) => return,
    };
    for system in targets {
        system.shutdown();
    }
}

/// Lightweight handle that stamps entries with a component and category
#[derive(Clone)]
pub struct ComponentLogger {
    system: Arc<LoggingSystem>,
    component: Arc<str>,
    category: LogCategory,
}

impl ComponentLogger {
    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn category(&self) -> LogCategory {
        self.category
    }

    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.system.is_enabled(level, self.category)
    }

    /// Log at `level`; the entry is only built if the level is enabled
    pub fn log(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        data: Option<LogData>,
        error: Option<ErrorInfo>,
    ) {
        if !self.is_enabled(level) {
            return;
        }

        let mut entry = LogEntry::new(level, self.category, &*self.component, message);
        if let Some(data) = data {
            entry = entry.with_data(data);
        }
        if let Some(error) = error {
            entry = entry.with_error(error);
        }
        self.system.dispatch(entry);
    }

    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, message, None, None);
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message, None, None);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message, None, None);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message, None, None);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message, None, None);
    }

    pub fn debug_with(&self, message: impl Into<String>, data: LogData) {
        self.log(LogLevel::Debug, message, Some(data), None);
    }

    pub fn info_with(&self, message: impl Into<String>, data: LogData) {
        self.log(LogLevel::Info, message, Some(data), None);
    }

    pub fn warn_with(&self, message: impl Into<String>, data: LogData) {
        self.log(LogLevel::Warn, message, Some(data), None);
    }

    pub fn error_with(&self, message: impl Into<String>, data: LogData) {
        self.log(LogLevel::Error, message, Some(data), None);
    }

    /// Log an error together with its cause chain
    pub fn error_with_cause(
        &self,
        message: impl Into<String>,
        cause: &(dyn std::error::Error + 'static),
    ) {
        if !self.is_enabled(LogLevel::Error) {
            return;
        }
        self.log(LogLevel::Error, message, None, Some(ErrorInfo::from_error(cause)));
    }
}

impl fmt::Debug for ComponentLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentLogger")
            .field("component", &self.component)
            .field("category", &self.category)
            .finish()
    }
}
