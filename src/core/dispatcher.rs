//! Shared logger group and its dispatcher thread
//!
//! Every logger view derived from the same root shares one [`Group`]: the
//! settings, the ordered target list, the bounded queue and the single thread
//! draining it. The dispatcher is the only code that ever calls into a target
//! once the group is open.

use super::entry::Entry;
use super::error::{LoggerError, Result, TargetFailure};
use super::level::Level;
use super::logger::Logger;
use super::metrics::DispatchMetrics;
use super::target::{report, stderr_writer, ErrorWriter, Record, Target};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

pub const DEFAULT_BUFFER_SIZE: usize = 1024;

const DISPATCHER_THREAD_NAME: &str = "log-dispatcher";

/// Message carried by the group queue
pub(crate) enum Envelope {
    /// An entry together with the view that issued it, whose formatter renders it
    Entry { entry: Entry, origin: Logger },
    /// Close marker; always the last message a dispatcher receives
    Flush,
}

#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub max_level: Level,
    pub call_stack_depth: usize,
    pub buffer_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_level: Level::Debug,
            call_stack_depth: 0,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

enum State {
    Idle,
    Running(JoinHandle<()>),
    Closed,
}

pub(crate) struct Group {
    pub(crate) settings: RwLock<Settings>,
    pub(crate) targets: Arc<Mutex<Vec<Box<dyn Target>>>>,
    pub(crate) error_writer: RwLock<ErrorWriter>,
    pub(crate) metrics: Arc<DispatchMetrics>,
    state: Mutex<State>,
    /// Held for the whole of `close`, so a concurrent close waits for the drain
    close_lock: Mutex<()>,
    /// Present only while running. Producers hold the read guard across a
    /// send so the close marker can never overtake an in-flight entry.
    sender: RwLock<Option<Sender<Envelope>>>,
}

impl Group {
    pub(crate) fn new(settings: Settings, targets: Vec<Box<dyn Target>>) -> Self {
        Self {
            settings: RwLock::new(settings),
            targets: Arc::new(Mutex::new(targets)),
            error_writer: RwLock::new(stderr_writer()),
            metrics: Arc::new(DispatchMetrics::new()),
            state: Mutex::new(State::Idle),
            close_lock: Mutex::new(()),
            sender: RwLock::new(None),
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        matches!(*self.state.lock(), State::Running(_))
    }

    /// Queue an envelope, blocking while the queue is full
    pub(crate) fn enqueue(&self, envelope: Envelope) {
        let guard = self.sender.read();
        let Some(sender) = guard.as_ref() else {
            self.metrics.record_rejected();
            return;
        };

        let sent = match sender.try_send(envelope) {
            Ok(()) => true,
            Err(TrySendError::Full(envelope)) => {
                self.metrics.record_block();
                sender.send(envelope).is_ok()
            }
            Err(TrySendError::Disconnected(_)) => false,
        };

        if sent {
            self.metrics.record_enqueued();
        } else {
            self.metrics.record_rejected();
        }
    }

    pub(crate) fn open(&self) -> Result<()> {
        let mut state = self.state.lock();
        match *state {
            State::Running(_) => return Err(LoggerError::AlreadyOpen),
            State::Closed => return Err(LoggerError::Closed),
            State::Idle => {}
        }

        let errors = self.error_writer.read().clone();
        let mut active = Vec::new();
        let mut failures = Vec::new();

        {
            let mut targets = self.targets.lock();
            for (index, target) in targets.iter_mut().enumerate() {
                let outcome =
                    catch_unwind(AssertUnwindSafe(|| target.open(Arc::clone(&errors))));
                let error = match outcome {
                    Ok(Ok(())) => {
                        active.push(index);
                        continue;
                    }
                    Ok(Err(e)) => e,
                    Err(panic_info) => LoggerError::target_open(
                        target.name(),
                        format!("panicked: {}", panic_message(panic_info.as_ref())),
                    ),
                };
                failures.push(TargetFailure {
                    index,
                    target: target.name().to_string(),
                    error: Box::new(error),
                });
            }
        }

        let buffer_size = self.settings.read().buffer_size.max(1);
        let (sender, receiver) = bounded(buffer_size);
        let dispatcher = Dispatcher {
            receiver,
            targets: Arc::clone(&self.targets),
            active: active.clone(),
            errors,
            metrics: Arc::clone(&self.metrics),
        };

        let spawned = thread::Builder::new()
            .name(DISPATCHER_THREAD_NAME.to_string())
            .spawn(move || dispatcher.run());

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                let mut targets = self.targets.lock();
                for index in active {
                    targets[index].process(Record::Flush);
                    targets[index].close();
                }
                return Err(LoggerError::io_operation(
                    "starting dispatcher",
                    "failed to spawn thread",
                    e,
                ));
            }
        };

        *self.sender.write() = Some(sender);
        *state = State::Running(handle);

        if failures.is_empty() {
            Ok(())
        } else {
            Err(LoggerError::TargetsFailed { failures })
        }
    }

    /// Flush and stop the dispatcher
    ///
    /// A call racing an ongoing close blocks until that close has finished;
    /// later calls return immediately.
    pub(crate) fn close(&self) {
        let _closing = self.close_lock.lock();
        let previous = std::mem::replace(&mut *self.state.lock(), State::Closed);
        let State::Running(handle) = previous else {
            return;
        };

        let sender = self.sender.write().take();
        if let Some(sender) = sender {
            let _ = sender.send(Envelope::Flush);
        }

        if handle.join().is_err() {
            report(
                &self.error_writer.read(),
                "[LOGGER CRITICAL] Dispatcher thread panicked before finishing close",
            );
        }
    }
}

struct Dispatcher {
    receiver: Receiver<Envelope>,
    targets: Arc<Mutex<Vec<Box<dyn Target>>>>,
    /// Indices into `targets` that opened successfully and have not failed since
    active: Vec<usize>,
    errors: ErrorWriter,
    metrics: Arc<DispatchMetrics>,
}

impl Dispatcher {
    fn run(mut self) {
        // A disconnected queue means every view was dropped without close
        while let Ok(Envelope::Entry { mut entry, origin }) = self.receiver.recv() {
            entry.formatted = self.format(&entry, &origin);
            drop(origin);
            self.deliver(Record::Entry(Arc::new(entry)));
            self.metrics.record_dispatched();
        }

        self.deliver(Record::Flush);
        self.close_targets();
    }

    fn format(&self, entry: &Entry, origin: &Logger) -> String {
        match catch_unwind(AssertUnwindSafe(|| origin.format_entry(entry))) {
            Ok(formatted) => formatted,
            Err(panic_info) => {
                report(
                    &self.errors,
                    format_args!(
                        "[LOGGER ERROR] Formatter for category '{}' panicked: {}",
                        origin.category(),
                        panic_message(panic_info.as_ref())
                    ),
                );
                entry.message.clone()
            }
        }
    }

    /// Hand a record to every active target in registration order
    ///
    /// A target that panics is reported and dropped from the active set; the
    /// others keep receiving records.
    fn deliver(&mut self, record: Record) {
        let mut targets = self.targets.lock();
        let mut failed = Vec::new();

        for &index in &self.active {
            let target = &mut targets[index];
            let record = record.clone();
            if let Err(panic_info) = catch_unwind(AssertUnwindSafe(|| target.process(record))) {
                self.metrics.record_target_failure();
                report(
                    &self.errors,
                    format_args!(
                        "[LOGGER CRITICAL] Target #{} ({}) panicked: {}. \
                         Other targets continue to function.",
                        index,
                        target.name(),
                        panic_message(panic_info.as_ref())
                    ),
                );
                failed.push(index);
            }
        }

        if !failed.is_empty() {
            self.active.retain(|index| !failed.contains(index));
        }
    }

    fn close_targets(&mut self) {
        let mut targets = self.targets.lock();
        for &index in &self.active {
            let target = &mut targets[index];
            if let Err(panic_info) = catch_unwind(AssertUnwindSafe(|| target.close())) {
                self.metrics.record_target_failure();
                report(
                    &self.errors,
                    format_args!(
                        "[LOGGER CRITICAL] Target #{} ({}) panicked during close: {}",
                        index,
                        target.name(),
                        panic_message(panic_info.as_ref())
                    ),
                );
            }
        }
        self.active.clear();
    }
}

pub(crate) fn panic_message(panic_info: &(dyn Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
