//! Bounded log aggregation for daemon output and workflow progress
//!
//! Every background stream reader and every workflow step reports through
//! this buffer; the shell reads it via `snapshot`. The buffer keeps the most
//! recent `LOG_CAPACITY` entries and evicts oldest-first.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Local};
use tokio::sync::Mutex;

/// Maximum number of retained log entries.
pub const LOG_CAPACITY: usize = 200;

/// A single timestamped, source-tagged log line.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub source: String,
    pub text: String,
}

impl LogEntry {
    /// Render the entry the way the shell displays it.
    pub fn display(&self) -> String {
        format!(
            "{} {}: {}",
            self.timestamp.format("%H:%M:%S"),
            self.source,
            self.text
        )
    }
}

/// Shared, capacity-bounded log buffer.
///
/// Cloning yields another handle to the same buffer, so reader tasks and the
/// shell can hold it independently.
#[derive(Clone, Default)]
pub struct LogAggregator {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
}

impl LogAggregator {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(LOG_CAPACITY))),
        }
    }

    /// Append one entry, evicting the oldest entry once over capacity.
    ///
    /// The timestamp is taken while the lock is held, so entries are always
    /// in non-decreasing timestamp order of insertion.
    pub async fn append(&self, source: &str, text: &str) {
        let mut entries = self.entries.lock().await;
        if entries.len() >= LOG_CAPACITY {
            entries.pop_front();
        }
        entries.push_back(LogEntry {
            timestamp: Local::now(),
            source: source.to_string(),
            text: text.to_string(),
        });
    }

    /// Return a copy of the retained entries in insertion order.
    pub async fn snapshot(&self) -> Vec<LogEntry> {
        let entries = self.entries.lock().await;
        entries.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
