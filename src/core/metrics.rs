//! Dispatch metrics for observability
//!
//! Counters shared by every logger view of a group. They track how entries
//! move from the producers through the queue to the targets.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one logger group
///
/// # Example
///
/// ```
/// use rust_log_dispatcher::DispatchMetrics;
///
/// let metrics = DispatchMetrics::new();
/// metrics.record_enqueued();
/// metrics.record_dispatched();
///
/// assert_eq!(metrics.enqueued_count(), 1);
/// assert_eq!(metrics.pending(), 0);
/// ```
#[derive(Debug)]
pub struct DispatchMetrics {
    /// Entries accepted into the queue
    enqueued: AtomicU64,

    /// Entries dropped by the level threshold before enqueueing
    filtered: AtomicU64,

    /// Entries delivered to the targets by the dispatcher
    dispatched: AtomicU64,

    /// Times a producer had to wait for queue space
    blocked: AtomicU64,

    /// Entries discarded because the logger was not open
    rejected: AtomicU64,

    /// Target panics caught by the dispatcher
    target_failures: AtomicU64,
}

impl DispatchMetrics {
    pub const fn new() -> Self {
        Self {
            enqueued: AtomicU64::new(0),
            filtered: AtomicU64::new(0),
            dispatched: AtomicU64::new(0),
            blocked: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            target_failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn enqueued_count(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered_count(&self) -> u64 {
        self.filtered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dispatched_count(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn blocked_count(&self) -> u64 {
        self.blocked.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn rejected_count(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn target_failure_count(&self) -> u64 {
        self.target_failures.load(Ordering::Relaxed)
    }

    /// Entries accepted but not yet handed to the targets
    pub fn pending(&self) -> u64 {
        self.enqueued_count().saturating_sub(self.dispatched_count())
    }

    #[inline]
    pub fn record_enqueued(&self) -> u64 {
        self.enqueued.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.filtered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dispatched(&self) -> u64 {
        self.dispatched.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_block(&self) -> u64 {
        self.blocked.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_rejected(&self) -> u64 {
        self.rejected.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_target_failure(&self) -> u64 {
        self.target_failures.fetch_add(1, Ordering::Relaxed)
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        self.enqueued.store(0, Ordering::Relaxed);
        self.filtered.store(0, Ordering::Relaxed);
        self.dispatched.store(0, Ordering::Relaxed);
        self.blocked.store(0, Ordering::Relaxed);
        self.rejected.store(0, Ordering::Relaxed);
        self.target_failures.store(0, Ordering::Relaxed);
    }
}

impl Default for DispatchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for DispatchMetrics {
    /// Snapshot of the current values
    fn clone(&self) -> Self {
        Self {
            enqueued: AtomicU64::new(self.enqueued_count()),
            filtered: AtomicU64::new(self.filtered_count()),
            dispatched: AtomicU64::new(self.dispatched_count()),
            blocked: AtomicU64::new(self.blocked_count()),
            rejected: AtomicU64::new(self.rejected_count()),
            target_failures: AtomicU64::new(self.target_failure_count()),
        }
    }
}
