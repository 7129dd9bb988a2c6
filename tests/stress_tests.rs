//! Stress tests for ordered, lossless dispatch
//!
//! These tests verify:
//! - Concurrent producers lose nothing when the queue is tiny and producers block
//! - Each producer's entries stay in program order
//! - Every target observes the same global order
//! - Close drains everything that was accepted

use rust_log_dispatcher::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

const PRODUCERS: usize = 8;
const PER_PRODUCER: usize = 500;

/// Target that sleeps a little on every entry, so producers back up
struct SlowTarget {
    seen: Arc<AtomicUsize>,
}

impl Target for SlowTarget {
    fn name(&self) -> &str {
        "slow"
    }

    fn open(&mut self, _errors: ErrorWriter) -> Result<()> {
        Ok(())
    }

    fn process(&mut self, record: Record) {
        if record.entry().is_some() && self.seen.fetch_add(1, Ordering::Relaxed) % 50 == 0 {
            thread::sleep(std::time::Duration::from_millis(1));
        }
    }

    fn close(&mut self) {}
}

fn parse(message: &str) -> (usize, usize) {
    let (producer, seq) = message
        .split_once(':')
        .expect("message has producer:seq shape");
    (producer.parse().unwrap(), seq.parse().unwrap())
}

#[test]
fn test_concurrent_producers_nothing_lost_order_kept() {
    let first = MemoryTarget::new();
    let second = MemoryTarget::new();
    let first_entries = first.entries_handle();
    let second_entries = second.entries_handle();
    let slow_seen = Arc::new(AtomicUsize::new(0));

    // A two-slot queue forces producers to block constantly
    let logger = Logger::builder()
        .buffer_size(2)
        .target(first)
        .target(SlowTarget {
            seen: Arc::clone(&slow_seen),
        })
        .target(second)
        .build();
    logger.open().unwrap();

    let barrier = Arc::new(Barrier::new(PRODUCERS));
    let handles: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            let view = logger.get_logger(format!("producer-{}", producer));
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for seq in 0..PER_PRODUCER {
                    view.info(format_args!("{}:{}", producer, seq));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    logger.close();

    let total = PRODUCERS * PER_PRODUCER;
    let first_entries = first_entries.lock();
    let second_entries = second_entries.lock();
    assert_eq!(first_entries.len(), total);
    assert_eq!(second_entries.len(), total);
    assert_eq!(slow_seen.load(Ordering::Relaxed), total);

    // Same global order in every target
    for (a, b) in first_entries.iter().zip(second_entries.iter()) {
        assert!(Arc::ptr_eq(a, b), "targets must share the same entry sequence");
    }

    // Per-producer program order
    let mut next: HashMap<usize, usize> = HashMap::new();
    for entry in first_entries.iter() {
        let (producer, seq) = parse(&entry.message);
        assert_eq!(entry.category, format!("producer-{}", producer));
        let expected = next.entry(producer).or_insert(0);
        assert_eq!(seq, *expected, "producer {} out of order", producer);
        *expected += 1;
    }

    let metrics = logger.metrics();
    assert_eq!(metrics.enqueued_count(), total as u64);
    assert_eq!(metrics.dispatched_count(), total as u64);
    assert_eq!(metrics.rejected_count(), 0);
    assert!(metrics.blocked_count() > 0, "a two-slot queue should have blocked");
}

#[test]
fn test_close_races_with_producers() {
    let memory = MemoryTarget::new();
    let entries = memory.entries_handle();
    let logger = Logger::builder().buffer_size(4).target(memory).build();
    logger.open().unwrap();

    let handles: Vec<_> = (0..4)
        .map(|producer| {
            let view = logger.get_logger("racer");
            thread::spawn(move || {
                for seq in 0..1_000 {
                    view.debug(format_args!("{}:{}", producer, seq));
                }
            })
        })
        .collect();

    thread::sleep(std::time::Duration::from_millis(5));
    logger.close();

    for handle in handles {
        handle.join().unwrap();
    }

    // Everything accepted before close was delivered; the rest was rejected
    let metrics = logger.metrics();
    assert_eq!(entries.lock().len() as u64, metrics.enqueued_count());
    assert_eq!(metrics.enqueued_count() + metrics.rejected_count(), 4_000);
}

#[test]
fn test_field_views_across_threads() {
    let memory = MemoryTarget::new();
    let entries = memory.entries_handle();
    let logger = Logger::builder().buffer_size(16).target(memory).build();
    logger.open().unwrap();

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let scoped = logger.with_fields(fields! { "worker" => worker });
            thread::spawn(move || {
                for job in 0..100 {
                    scoped.with_field("job", job).notice("done");
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    logger.close();

    let entries = entries.lock();
    assert_eq!(entries.len(), 400);
    for entry in entries.iter() {
        let fields = entry.fields.as_ref().unwrap();
        assert_eq!(fields.len(), 2);
        assert!(fields.get("worker").and_then(FieldValue::as_int).is_some());
    }
}
