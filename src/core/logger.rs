//! Logger views over a shared dispatcher group

use super::dispatcher::{Envelope, Group, Settings};
use super::entry::Entry;
use super::error::Result;
use super::fields::{FieldValue, Fields};
use super::formatter::{default_formatter, Formatter};
use super::level::Level;
use super::metrics::DispatchMetrics;
use super::target::{ErrorWriter, Target};
use parking_lot::Mutex;
use std::fmt;
use std::io::Write;
use std::sync::Arc;

pub const DEFAULT_CATEGORY: &str = "app";

macro_rules! level_methods {
    ($($(#[$doc:meta])* $name:ident => $level:expr),+ $(,)?) => {
        $(
            $(#[$doc])*
            #[inline]
            pub fn $name(&self, message: impl fmt::Display) {
                self.log($level, message);
            }
        )+
    };
}

macro_rules! all_level_methods {
    () => {
        level_methods! {
            debug => Level::Debug,
            info => Level::Info,
            notice => Level::Notice,
            warning => Level::Warning,
            error => Level::Error,
            critical => Level::Critical,
            alert => Level::Alert,
            emergency => Level::Emergency,
        }
    };
}

/// A named view over a logger group
///
/// Cloning a logger, or deriving one with [`Logger::get_logger`], yields
/// another view over the same queue, dispatcher and targets. The category
/// and formatter belong to the view; everything else is shared.
///
/// # Example
///
/// ```
/// use rust_log_dispatcher::{Level, Logger};
/// use rust_log_dispatcher::targets::MemoryTarget;
///
/// let logger = Logger::new();
/// logger.add_target(MemoryTarget::new());
/// logger.open().unwrap();
///
/// let db = logger.get_logger("db");
/// db.info(format_args!("connected in {}ms", 12));
/// logger.log(Level::Warning, "cache cold");
///
/// logger.close();
/// ```
#[derive(Clone)]
pub struct Logger {
    group: Arc<Group>,
    category: Arc<str>,
    formatter: Formatter,
}

impl Logger {
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(Settings::default(), DEFAULT_CATEGORY, Vec::new(), default_formatter())
    }

    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    fn from_parts(
        settings: Settings,
        category: &str,
        targets: Vec<Box<dyn Target>>,
        formatter: Formatter,
    ) -> Self {
        Self {
            group: Arc::new(Group::new(settings, targets)),
            category: Arc::from(category),
            formatter,
        }
    }

    pub fn max_level(&self) -> Level {
        self.group.settings.read().max_level
    }

    /// Shared by every view of the group; takes effect for the next call
    pub fn set_max_level(&self, level: Level) {
        self.group.settings.write().max_level = level;
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Rename this view only
    pub fn set_category(&mut self, category: impl Into<String>) {
        self.category = Arc::from(category.into());
    }

    pub fn call_stack_depth(&self) -> usize {
        self.group.settings.read().call_stack_depth
    }

    /// Number of caller frames attached to each entry; zero disables capture
    pub fn set_call_stack_depth(&self, depth: usize) {
        self.group.settings.write().call_stack_depth = depth;
    }

    pub fn buffer_size(&self) -> usize {
        self.group.settings.read().buffer_size
    }

    /// Capacity of the group queue, read when the group is opened
    pub fn set_buffer_size(&self, size: usize) {
        self.group.settings.write().buffer_size = size;
    }

    pub fn formatter(&self) -> &Formatter {
        &self.formatter
    }

    pub fn set_formatter(&mut self, formatter: Formatter) {
        self.formatter = formatter;
    }

    /// Where targets report failures they cannot return; read when the group is opened
    pub fn set_error_writer(&self, writer: impl Write + Send + 'static) {
        *self.group.error_writer.write() = Arc::new(Mutex::new(Box::new(writer)));
    }

    pub fn error_writer(&self) -> ErrorWriter {
        self.group.error_writer.read().clone()
    }

    /// Append a target; targets added after `open` are not part of the running session
    pub fn add_target<T: Target>(&self, target: T) {
        self.add_boxed_target(Box::new(target));
    }

    pub fn add_boxed_target(&self, target: Box<dyn Target>) {
        self.group.targets.lock().push(target);
    }

    pub fn target_count(&self) -> usize {
        self.group.targets.lock().len()
    }

    /// Inspect the configured targets in registration order
    ///
    /// While the group is open this competes with the dispatcher for the
    /// target list, so keep `f` short.
    pub fn with_targets<R>(&self, f: impl FnOnce(&[Box<dyn Target>]) -> R) -> R {
        let targets = self.group.targets.lock();
        f(&targets)
    }

    /// A view with its own category over the same group
    pub fn get_logger(&self, category: impl Into<String>) -> Logger {
        Logger {
            group: Arc::clone(&self.group),
            category: Arc::from(category.into()),
            formatter: Arc::clone(&self.formatter),
        }
    }

    pub fn get_logger_with_formatter(
        &self,
        category: impl Into<String>,
        formatter: Formatter,
    ) -> Logger {
        let mut logger = self.get_logger(category);
        logger.formatter = formatter;
        logger
    }

    /// A view that attaches `fields` to every entry it logs
    pub fn with_fields(&self, fields: Fields) -> FieldLogger {
        FieldLogger {
            logger: self.clone(),
            fields: Arc::new(fields),
        }
    }

    /// Open every target and start the dispatcher
    ///
    /// Targets that fail to open are left out of the session. Their errors
    /// come back as [`LoggerError::TargetsFailed`](super::error::LoggerError::TargetsFailed)
    /// once the dispatcher is already serving the remaining targets.
    pub fn open(&self) -> Result<()> {
        self.group.open()
    }

    /// Flush every target and stop the dispatcher for the whole group
    ///
    /// Returns once each active target has received the flush marker and
    /// finished its own `close`. Calling it again does nothing.
    pub fn close(&self) {
        self.group.close();
    }

    pub fn is_open(&self) -> bool {
        self.group.is_open()
    }

    pub fn metrics(&self) -> &DispatchMetrics {
        &self.group.metrics
    }

    /// Log `message` at `level`, blocking while the queue is full
    ///
    /// Entries above the max level are dropped here. Entries logged while
    /// the group is not open are discarded and counted as rejected.
    pub fn log(&self, level: Level, message: impl fmt::Display) {
        self.dispatch(level, message, None);
    }

    all_level_methods!();

    fn dispatch(&self, level: Level, message: impl fmt::Display, fields: Option<&Fields>) {
        let (max_level, depth) = {
            let settings = self.group.settings.read();
            (settings.max_level, settings.call_stack_depth)
        };

        if !level.passes(max_level) {
            self.group.metrics.record_filtered();
            return;
        }

        let mut entry = Entry::render(level, &*self.category, message).with_call_stack(depth);
        if let Some(fields) = fields {
            entry = entry.with_fields(fields.clone());
        }

        self.group.enqueue(Envelope::Entry {
            entry,
            origin: self.clone(),
        });
    }

    pub(crate) fn format_entry(&self, entry: &Entry) -> String {
        (self.formatter)(self, entry)
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("category", &self.category)
            .field("max_level", &self.max_level())
            .field("call_stack_depth", &self.call_stack_depth())
            .field("target_count", &self.target_count())
            .field("open", &self.is_open())
            .finish()
    }
}

/// A logger view with bound fields
///
/// Every entry receives its own copy of the fields.
#[derive(Clone)]
pub struct FieldLogger {
    logger: Logger,
    fields: Arc<Fields>,
}

impl FieldLogger {
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// A wider view with one more bound field
    #[must_use]
    pub fn with_field(&self, key: impl Into<String>, value: impl Into<FieldValue>) -> FieldLogger {
        let fields = (*self.fields).clone().with_field(key, value);
        FieldLogger {
            logger: self.logger.clone(),
            fields: Arc::new(fields),
        }
    }

    pub fn log(&self, level: Level, message: impl fmt::Display) {
        self.logger.dispatch(level, message, Some(&self.fields));
    }

    all_level_methods!();
}

impl fmt::Debug for FieldLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldLogger")
            .field("logger", &self.logger)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Builder for constructing a Logger with a fluent API
///
/// # Example
/// ```
/// use rust_log_dispatcher::prelude::*;
///
/// let logger = Logger::builder()
///     .max_level(Level::Notice)
///     .category("worker")
///     .target(MemoryTarget::new())
///     .buffer_size(256)
///     .build();
///
/// assert_eq!(logger.category(), "worker");
/// assert_eq!(logger.target_count(), 1);
/// ```
pub struct LoggerBuilder {
    settings: Settings,
    category: String,
    targets: Vec<Box<dyn Target>>,
    formatter: Option<Formatter>,
    error_writer: Option<Box<dyn Write + Send>>,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
            category: DEFAULT_CATEGORY.to_string(),
            targets: Vec::new(),
            formatter: None,
            error_writer: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn max_level(mut self, level: Level) -> Self {
        self.settings.max_level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn call_stack_depth(mut self, depth: usize) -> Self {
        self.settings.call_stack_depth = depth;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.settings.buffer_size = size;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn target<T: Target>(mut self, target: T) -> Self {
        self.targets.push(Box::new(target));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = Some(formatter);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn error_writer(mut self, writer: impl Write + Send + 'static) -> Self {
        self.error_writer = Some(Box::new(writer));
        self
    }

    pub fn build(self) -> Logger {
        let formatter = self.formatter.unwrap_or_else(default_formatter);
        let logger = Logger::from_parts(self.settings, &self.category, self.targets, formatter);
        if let Some(writer) = self.error_writer {
            *logger.group.error_writer.write() = Arc::new(Mutex::new(writer));
        }
        logger
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
