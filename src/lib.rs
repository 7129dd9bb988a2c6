//! # Rust Log Dispatcher
//!
//! A structured logging dispatcher: log calls are filtered by severity,
//! enriched with time, category, optional call stack and bound fields, and
//! fanned out in order to a set of pluggable targets by one dispatcher thread.
//!
//! ## Features
//!
//! - **Ordered fan-out**: every target sees entries in the same order they were queued
//! - **Shared pipelines**: `get_logger` derives named views over one queue and target set
//! - **Clean shutdown**: `close` returns once every target drained and closed
//! - **Structured fields**: `with_fields` binds key/value data to a view
//!
//! ```
//! use rust_log_dispatcher::prelude::*;
//!
//! let memory = MemoryTarget::new();
//! let entries = memory.entries_handle();
//!
//! let logger = Logger::new();
//! logger.add_target(memory);
//! logger.open().unwrap();
//!
//! let http = logger.get_logger("http");
//! http.with_fields(fields! { "status" => 200 }).info("request served");
//! logger.close();
//!
//! assert_eq!(entries.lock()[0].category, "http");
//! ```

pub mod config;
pub mod core;
pub mod macros;
pub mod targets;

pub mod prelude {
    pub use crate::config::{LoggerConfig, TargetRegistry};
    pub use crate::core::{
        default_formatter, json_formatter, text_formatter, DispatchMetrics, Entry, ErrorWriter,
        FieldLogger, FieldValue, Fields, Filter, Formatter, Level, Logger, LoggerBuilder,
        LoggerError, Record, Result, Target, TimestampFormat,
    };
    pub use crate::fields;
    pub use crate::targets::MemoryTarget;
    #[cfg(feature = "console")]
    pub use crate::targets::ConsoleTarget;
    #[cfg(feature = "file")]
    pub use crate::targets::FileTarget;
    #[cfg(feature = "network")]
    pub use crate::targets::NetworkTarget;
}

pub use core::{
    default_formatter, json_formatter, report, stderr_writer, text_formatter, DispatchMetrics,
    Entry, ErrorWriter, FieldLogger, FieldValue, Fields, Filter, Formatter, Level, Logger,
    LoggerBuilder, LoggerError, Record, Result, Target, TargetFailure, TimestampFormat,
    DEFAULT_BUFFER_SIZE, DEFAULT_CATEGORY,
};
