//! In-memory target
//!
//! Keeps every accepted entry in a shared list. Mostly useful for tests and
//! for inspecting what a configuration actually delivers.

use crate::core::{ErrorWriter, Entry, Filter, Record, Result, Target};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub type SharedEntries = Arc<Mutex<Vec<Arc<Entry>>>>;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryTarget {
    /// Free-form tag, handy for telling several memory targets apart
    pub label: String,
    /// Keep at most this many entries, evicting the oldest
    pub capacity: Option<usize>,
    pub filter: Filter,
    #[serde(skip)]
    entries: SharedEntries,
    #[serde(skip)]
    flushed: Arc<AtomicBool>,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Snapshot of the entries received so far
    pub fn entries(&self) -> Vec<Arc<Entry>> {
        self.entries.lock().clone()
    }

    /// The live entry list; stays valid after the target moved into a logger
    pub fn entries_handle(&self) -> SharedEntries {
        Arc::clone(&self.entries)
    }

    /// Raw messages received so far, in order
    pub fn messages(&self) -> Vec<String> {
        self.entries.lock().iter().map(|e| e.message.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Whether the flush marker has been received
    pub fn is_flushed(&self) -> bool {
        self.flushed.load(Ordering::Acquire)
    }

    pub fn flushed_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flushed)
    }
}

impl Target for MemoryTarget {
    fn name(&self) -> &str {
        "memory"
    }

    fn open(&mut self, _errors: ErrorWriter) -> Result<()> {
        self.flushed.store(false, Ordering::Release);
        Ok(())
    }

    fn process(&mut self, record: Record) {
        match record {
            Record::Entry(entry) => {
                if !self.filter.allows(&entry) {
                    return;
                }
                let mut entries = self.entries.lock();
                if let Some(capacity) = self.capacity {
                    if capacity == 0 {
                        return;
                    }
                    if entries.len() >= capacity {
                        let excess = entries.len() + 1 - capacity;
                        entries.drain(..excess);
                    }
                }
                entries.push(entry);
            }
            Record::Flush => self.flushed.store(true, Ordering::Release),
        }
    }

    fn close(&mut self) {}
}
