//! Core dispatcher types and traits

mod call_stack;
pub mod dispatcher;
pub mod entry;
pub mod error;
pub mod fields;
pub mod formatter;
pub mod level;
pub mod logger;
pub mod metrics;
pub mod target;

pub use dispatcher::DEFAULT_BUFFER_SIZE;
pub use entry::Entry;
pub use error::{LoggerError, Result, TargetFailure};
pub use fields::{FieldValue, Fields};
pub use formatter::{default_formatter, json_formatter, text_formatter, Formatter, TimestampFormat};
pub use level::Level;
pub use logger::{FieldLogger, Logger, LoggerBuilder, DEFAULT_CATEGORY};
pub use metrics::DispatchMetrics;
pub use target::{report, stderr_writer, ErrorWriter, Filter, Record, Target};
