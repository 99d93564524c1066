// Listener hub - synchronous, isolated fan-out of accepted entries

use crate::fallback;
use crate::logs::entry::LogEntry;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Receives every accepted entry on the logging caller's thread
pub trait LogListener: Send + Sync {
    fn on_entry(&self, entry: &LogEntry);
}

impl<F> LogListener for F
where
    F: Fn(&LogEntry) + Send + Sync,
{
    fn on_entry(&self, entry: &LogEntry) {
        self(entry)
    }
}

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Registration = (ListenerId, Arc<dyn LogListener>);

/// Registry of subscribers
///
/// Notification iterates a snapshot, so subscribe/unsubscribe never wait on
/// a slow listener and a listener may unsubscribe itself.
pub struct ListenerHub {
    listeners: Mutex<Vec<Registration>>,
    next_id: AtomicU64,
}

impl ListenerHub {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn subscribe(&self, listener: Arc<dyn LogListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push((id, listener));
        }
        id
    }

    /// Remove a listener; returns false if it was not registered
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        match self.listeners.lock() {
            Ok(mut listeners) => {
                let before = listeners.len();
                listeners.retain(|(existing, _)| *existing != id);
                listeners.len() != before
            }
            Err(_) => false,
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver an entry to every listener.
    ///
    /// A panicking listener is reported and skipped; the others still run and
    /// nothing propagates to the caller.
    pub(crate) fn notify(&self, entry: &LogEntry) {
        let snapshot: Vec<Registration> = match self.listeners.lock() {
            Ok(listeners) if !listeners.is_empty() => listeners.clone(),
            _ => return,
        };

        for (id, listener) in snapshot {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener.on_entry(entry)));
            if let Err(payload) = outcome {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                fallback::report_error(&format!("log listener {:?} panicked", id), &reason);
            }
        }
    }
}

impl Default for ListenerHub {
    fn default() -> Self {
        Self::new()
    }
}
