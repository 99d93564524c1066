//! In-memory ring buffer of recent entries for live inspection
//!
//! The lock is held only to mutate the deque or to copy it out. Filtering for
//! `query` runs on the copy, so a slow consumer never stalls producers.

use crate::logs::entry::{LogCategory, LogEntry, LogLevel};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Default number of entries retained
pub const DEFAULT_CAPACITY: usize = 1000;

/// Thread-safe, fixed-capacity FIFO of accepted log entries
pub struct RingBuffer {
    entries: Mutex<VecDeque<Arc<LogEntry>>>,
    capacity: usize,
}

impl RingBuffer {
    /// Create a buffer holding at most `capacity` entries (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append an entry, evicting the oldest when full
    pub fn record(&self, entry: Arc<LogEntry>) {
        if let Ok(mut entries) = self.entries.lock() {
            while entries.len() >= self.capacity {
                entries.pop_front();
            }
            entries.push_back(entry);
        }
    }

    /// Most recent entries matching the filters, oldest to newest.
    ///
    /// # Arguments
    /// * `limit` - Maximum number of entries returned
    /// * `category` - Only entries of this category, if set
    /// * `min_level` - Only entries at or above this level
    pub fn query(
        &self,
        limit: usize,
        category: Option<LogCategory>,
        min_level: LogLevel,
    ) -> Vec<Arc<LogEntry>> {
        let snapshot: Vec<Arc<LogEntry>> = match self.entries.lock() {
            Ok(entries) => entries.iter().cloned().collect(),
            Err(_) => return Vec::new(),
        };

        let mut matched: Vec<Arc<LogEntry>> = snapshot
            .into_iter()
            .rev()
            .filter(|e| e.level.priority() >= min_level.priority())
            .filter(|e| category.map_or(true, |c| e.category == c))
            .take(limit)
            .collect();
        matched.reverse();
        matched
    }

    /// Every retained entry, oldest first
    pub fn all_entries(&self) -> Vec<Arc<LogEntry>> {
        self.query(self.capacity, None, LogLevel::Trace)
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for RingBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
