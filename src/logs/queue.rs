// Async file writer - bounded drop-oldest queue feeding one dedicated writer thread

use crate::error::{CorelogError, Result};
use crate::fallback::{self, RateLimiter, DROP_WARNING_WINDOW};
use crate::logs::entry::LogEntry;
use crate::logs::writer::{LogFileWriter, RotationPolicy};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::Notify;

/// Default number of entries waiting for the writer
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Name of the dedicated writer thread
pub const WRITER_THREAD_NAME: &str = "corelog-writer";

/// Counters that survive writer restarts
///
/// After a full drain, `dropped == submitted - written`. The overflow warning
/// window lives here too, so a disable/enable cycle cannot reopen it.
#[derive(Debug)]
pub struct WriterStats {
    written: AtomicU64,
    dropped: AtomicU64,
    drop_warning: RateLimiter,
}

impl Default for WriterStats {
    fn default() -> Self {
        Self {
            written: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            drop_warning: RateLimiter::new(DROP_WARNING_WINDOW),
        }
    }
}

impl WriterStats {
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::SeqCst)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::SeqCst)
    }

    fn add_dropped(&self, n: u64) -> u64 {
        self.dropped.fetch_add(n, Ordering::SeqCst) + n
    }
}

struct QueueState {
    entries: VecDeque<Arc<LogEntry>>,
    accepting: bool,
}

struct Shared {
    state: Mutex<QueueState>,
    capacity: usize,
    notify: Notify,
    stopping: AtomicBool,
    abort: AtomicBool,
    stats: Arc<WriterStats>,
    /// Set once a permission failure disabled file logging for the process
    fault: Arc<AtomicBool>,
}

impl Shared {
    fn new(capacity: usize, stats: Arc<WriterStats>, fault: Arc<AtomicBool>) -> Self {
        Self {
            state: Mutex::new(QueueState {
                entries: VecDeque::with_capacity(capacity),
                accepting: true,
            }),
            capacity,
            notify: Notify::new(),
            stopping: AtomicBool::new(false),
            abort: AtomicBool::new(false),
            stats,
            fault,
        }
    }

    fn pop(&self) -> Option<Arc<LogEntry>> {
        self.state.lock().ok().and_then(|mut s| s.entries.pop_front())
    }

    /// Stop accepting and discard everything still queued, counting it dropped
    fn close_and_discard(&self) -> u64 {
        let discarded = match self.state.lock() {
            Ok(mut state) => {
                state.accepting = false;
                let n = state.entries.len() as u64;
                state.entries.clear();
                n
            }
            Err(_) => 0,
        };
        if discarded > 0 {
            self.stats.add_dropped(discarded);
        }
        discarded
    }
}

/// Non-blocking front end to the log file
///
/// Producers call `enqueue` from any thread. A single `corelog-writer` thread
/// owns the `LogFileWriter` and consumes entries in order.
pub struct AsyncFileWriter {
    shared: Arc<Shared>,
    path: PathBuf,
    policy: RotationPolicy,
    thread: Mutex<Option<JoinHandle<()>>>,
    done: Mutex<Option<mpsc::Receiver<()>>>,
}

impl AsyncFileWriter {
    /// Open the log file and start the writer thread
    ///
    /// # Arguments
    /// * `path` - Base log file path
    /// * `policy` - Rotation and formatting settings
    /// * `capacity` - Maximum queued entries before drop-oldest kicks in
    /// * `stats` - Shared counters, kept across enable/disable cycles
    /// * `fault` - Flag raised when a permission error disables file logging
    ///
    /// # Returns
    /// * `Ok(AsyncFileWriter)` - Writer running and accepting entries
    /// * `Err(CorelogError)` - File could not be opened or thread not spawned
    pub fn start(
        path: &Path,
        policy: RotationPolicy,
        capacity: usize,
        stats: Arc<WriterStats>,
        fault: Arc<AtomicBool>,
    ) -> Result<Self> {
        if fault.load(Ordering::SeqCst) {
            return Err(CorelogError::PermissionDenied(
                "file logging was disabled after a permission failure".to_string(),
            ));
        }

        let capacity = capacity.max(1);
        let shared = Arc::new(Shared::new(capacity, stats, fault));

        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();
        let (done_tx, done_rx) = mpsc::channel::<()>();
        let worker_shared = Arc::clone(&shared);
        let worker_path = path.to_path_buf();

        let handle = std::thread::Builder::new()
            .name(WRITER_THREAD_NAME.to_string())
            .spawn(move || {
                writer_thread(worker_shared, worker_path, policy, ready_tx);
                let _ = done_tx.send(());
            })
            .map_err(|e| CorelogError::WriterThread(format!("Failed to spawn writer: {}", e)))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = handle.join();
                return Err(e);
            }
            Err(_) => {
                let _ = handle.join();
                return Err(CorelogError::WriterThread(
                    "writer thread exited during startup".to_string(),
                ));
            }
        }

        tracing::debug!(path = %path.display(), capacity, "file writer started");

        Ok(Self {
            shared,
            path: path.to_path_buf(),
            policy,
            thread: Mutex::new(Some(handle)),
            done: Mutex::new(Some(done_rx)),
        })
    }

    /// Queue an entry for the file without ever blocking.
    ///
    /// When the queue is full the oldest queued entry is discarded to make
    /// room. Returns false if the writer no longer accepts entries.
    pub fn enqueue(&self, entry: Arc<LogEntry>) -> bool {
        let evicted = {
            let Ok(mut state) = self.shared.state.lock() else {
                return false;
            };
            if !state.accepting {
                return false;
            }
            let evicted = if state.entries.len() >= self.shared.capacity {
                state.entries.pop_front().is_some()
            } else {
                false
            };
            state.entries.push_back(entry);
            evicted
        };

        if evicted {
            let total = self.shared.stats.add_dropped(1);
            if self.shared.stats.drop_warning.try_acquire() {
                fallback::report_warning(&format!(
                    "log file queue full, dropping oldest entries ({} dropped so far)",
                    total
                ));
            }
        }

        self.shared.notify.notify_one();
        true
    }

    /// Stop accepting, drain for at most `timeout`, then stop the thread.
    ///
    /// Returns the number of entries abandoned because the drain timed out.
    /// Calling this more than once is harmless.
    pub fn stop(&self, timeout: Duration) -> u64 {
        if let Ok(mut state) = self.shared.state.lock() {
            state.accepting = false;
        }
        self.shared.stopping.store(true, Ordering::SeqCst);
        self.shared.notify.notify_one();

        let done = match self.done.lock() {
            Ok(mut done) => done.take(),
            Err(_) => None,
        };
        let Some(done) = done else {
            return 0;
        };

        let finished = !matches!(
            done.recv_timeout(timeout),
            Err(mpsc::RecvTimeoutError::Timeout)
        );

        if finished {
            if let Some(handle) = self.thread.lock().ok().and_then(|mut t| t.take()) {
                let _ = handle.join();
            }
        } else {
            self.shared.abort.store(true, Ordering::SeqCst);
            self.shared.notify.notify_one();
        }

        let abandoned = self.shared.close_and_discard();
        if abandoned > 0 {
            fallback::report_warning(&format!(
                "log writer drain timed out, {} queued entries lost",
                abandoned
            ));
        }
        abandoned
    }

    /// Whether entries are currently accepted
    pub fn is_running(&self) -> bool {
        !self.shared.fault.load(Ordering::SeqCst)
            && self.shared.state.lock().map(|s| s.accepting).unwrap_or(false)
    }

    pub fn queued_len(&self) -> usize {
        self.shared.state.lock().map(|s| s.entries.len()).unwrap_or(0)
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Rotation settings the writer thread was started with
    pub fn policy(&self) -> RotationPolicy {
        self.policy
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn written_count(&self) -> u64 {
        self.shared.stats.written()
    }

    pub fn dropped_count(&self) -> u64 {
        self.shared.stats.dropped()
    }
}

impl Drop for AsyncFileWriter {
    fn drop(&mut self) {
        // Let the detached thread finish what is queued and exit.
        if let Ok(mut state) = self.shared.state.lock() {
            state.accepting = false;
        }
        self.shared.stopping.store(true, Ordering::SeqCst);
        self.shared.notify.notify_one();
    }
}

fn writer_thread(
    shared: Arc<Shared>,
    path: PathBuf,
    policy: RotationPolicy,
    ready: mpsc::Sender<Result<()>>,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            let _ = ready.send(Err(CorelogError::WriterThread(format!(
                "Failed to build writer runtime: {}",
                e
            ))));
            return;
        }
    };

    runtime.block_on(async move {
        let writer = match LogFileWriter::open(&path, policy).await {
            Ok(w) => w,
            Err(e) => {
                if e.is_permission_error() {
                    shared.fault.store(true, Ordering::SeqCst);
                }
                let _ = ready.send(Err(e));
                return;
            }
        };
        let _ = ready.send(Ok(()));
        drop(ready);

        run_writer(&shared, writer).await;
    });
}

/// Count the failed entry as dropped; returns false once the writer must stop.
///
/// A permission failure raises the fault flag and discards the queue. Any
/// other error only costs the one entry.
fn handle_write_failure(shared: &Shared, err: &CorelogError) -> bool {
    shared.stats.add_dropped(1);

    if err.is_permission_error() {
        shared.fault.store(true, Ordering::SeqCst);
        fallback::report_error("file logging disabled permanently", err);
        shared.close_and_discard();
        return false;
    }

    fallback::report_error("dropping log entry after file error", err);
    true
}

/// Consume entries serially until stopped, aborted or faulted
async fn run_writer(shared: &Shared, mut writer: LogFileWriter) {
    loop {
        if shared.abort.load(Ordering::SeqCst) {
            break;
        }

        let Some(entry) = shared.pop() else {
            if shared.stopping.load(Ordering::SeqCst) {
                break;
            }
            shared.notify.notified().await;
            continue;
        };

        match writer.write_entry(&entry).await {
            Ok(()) => {
                shared.stats.written.fetch_add(1, Ordering::SeqCst);
            }
            Err(e) => {
                if !handle_write_failure(shared, &e) {
                    break;
                }
            }
        }
    }

    let _ = writer.flush().await;
    tracing::debug!(path = %writer.path().display(), "file writer stopped");
}
