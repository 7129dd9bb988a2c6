//! Background writer shared by the I/O-bound targets
//!
//! A target hands entries to its worker through a bounded queue and returns
//! immediately; the worker owns the actual sink and performs the writes.
//! Dropping the queue's sender is the drain signal.

use crate::core::dispatcher::panic_message;
use crate::core::{report, Entry, ErrorWriter, LoggerError, Result};
use crossbeam_channel::{bounded, Sender};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

pub(crate) const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// The write side of a target, owned by its worker thread
pub(crate) trait Sink: Send + 'static {
    fn write(&mut self, entry: &Entry) -> Result<()>;

    /// Flush buffered output; called once, after the last write
    fn finish(&mut self) -> Result<()>;
}

pub(crate) struct Worker {
    label: String,
    sender: Option<Sender<Arc<Entry>>>,
    handle: Option<JoinHandle<()>>,
    errors: ErrorWriter,
    /// Entries refused because the worker thread already exited
    dropped: AtomicU64,
}

impl Worker {
    pub(crate) fn spawn<S: Sink>(
        target: &str,
        capacity: usize,
        mut sink: S,
        errors: ErrorWriter,
    ) -> Result<Self> {
        let (sender, receiver) = bounded::<Arc<Entry>>(capacity.max(1));
        let label = target.to_string();
        let worker_errors = Arc::clone(&errors);

        let handle = thread::Builder::new()
            .name(format!("log-target-{}", target))
            .spawn(move || {
                let errors = worker_errors;
                for entry in receiver {
                    let outcome = catch_unwind(AssertUnwindSafe(|| sink.write(&entry)));
                    match outcome {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => {
                            report(&errors, format_args!("[LOGGER ERROR] Target '{}' failed: {}", label, e));
                        }
                        Err(panic_info) => {
                            report(
                                &errors,
                                format_args!(
                                    "[LOGGER CRITICAL] Target '{}' panicked while writing: {}",
                                    label,
                                    panic_message(panic_info.as_ref())
                                ),
                            );
                            return;
                        }
                    }
                }

                if let Err(e) = sink.finish() {
                    report(
                        &errors,
                        format_args!("[LOGGER ERROR] Target '{}' flush failed: {}", label, e),
                    );
                }
            })
            .map_err(|e| {
                LoggerError::io_operation(
                    "starting target worker",
                    format!("failed to spawn worker for '{}'", target),
                    e,
                )
            })?;

        Ok(Self {
            label: target.to_string(),
            sender: Some(sender),
            handle: Some(handle),
            errors,
            dropped: AtomicU64::new(0),
        })
    }

    /// Queue an entry, blocking while the worker is behind
    pub(crate) fn submit(&self, entry: Arc<Entry>) {
        let Some(ref sender) = self.sender else {
            return;
        };
        if sender.send(entry).is_err() && self.dropped.fetch_add(1, Ordering::Relaxed) == 0 {
            report(
                &self.errors,
                format_args!(
                    "[LOGGER ERROR] Target '{}' stopped writing; further entries are dropped",
                    self.label
                ),
            );
        }
    }

    pub(crate) fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stop accepting entries; the worker writes what it has and exits
    pub(crate) fn drain(&mut self) {
        self.sender.take();
    }

    /// Drain and wait for the worker to exit
    pub(crate) fn join(&mut self) {
        self.drain();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        let dropped = self.dropped.swap(0, Ordering::Relaxed);
        if dropped > 0 {
            report(
                &self.errors,
                format_args!("[LOGGER ERROR] Target '{}' dropped {} entries", self.label, dropped),
            );
        }
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("label", &self.label)
            .field("accepting", &self.sender.is_some())
            .field("dropped", &self.dropped_count())
            .finish()
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.join();
    }
}
