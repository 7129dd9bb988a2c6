//! Logging macros for ergonomic log message formatting.
//!
//! The macros render their arguments with `format_args!`, so nothing is
//! allocated for entries the logger filters out by level.
//!
//! # Examples
//!
//! ```
//! use rust_log_dispatcher::prelude::*;
//! use rust_log_dispatcher::info;
//!
//! let logger = Logger::new();
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//!
//! // Works on field-bound views too
//! let request = logger.with_fields(fields! { "request_id" => "r-17" });
//! info!(request, "User {} performed action: {}", 42, "login");
//! ```

/// Log a message at an explicit level.
///
/// # Examples
///
/// ```
/// # use rust_log_dispatcher::prelude::*;
/// # let logger = Logger::new();
/// use rust_log_dispatcher::log;
/// log!(logger, Level::Info, "Simple message");
/// log!(logger, Level::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, ::std::format_args!($($arg)+))
    };
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use rust_log_dispatcher::prelude::*;
/// # let logger = Logger::new();
/// use rust_log_dispatcher::debug;
/// debug!(logger, "Counter value: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Info, $($arg)+)
    };
}

/// Log a notice-level message.
#[macro_export]
macro_rules! notice {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Notice, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// # Examples
///
/// ```
/// # use rust_log_dispatcher::prelude::*;
/// # let logger = Logger::new();
/// use rust_log_dispatcher::warning;
/// let usage = 85;
/// warning!(logger, "Memory usage high: {}%", usage);
/// ```
#[macro_export]
macro_rules! warning {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Warning, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Error, $($arg)+)
    };
}

/// Log a critical-level message.
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Critical, $($arg)+)
    };
}

/// Log an alert-level message.
#[macro_export]
macro_rules! alert {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Alert, $($arg)+)
    };
}

/// Log an emergency-level message.
///
/// # Examples
///
/// ```
/// # use rust_log_dispatcher::prelude::*;
/// # let logger = Logger::new();
/// use rust_log_dispatcher::emergency;
/// emergency!(logger, "Disk {} is gone", "/dev/sda");
/// ```
#[macro_export]
macro_rules! emergency {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Emergency, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::targets::MemoryTarget;
    use crate::{Level, Logger};

    #[test]
    fn test_macros_reach_targets() {
        let memory = MemoryTarget::new();
        let entries = memory.entries_handle();
        let logger = Logger::builder().target(memory).build();
        logger.open().unwrap();

        let count = 3;
        crate::info!(logger, "Processing {} items", count);
        crate::warning!(logger, "plain");
        crate::log!(logger, Level::Alert, "{}-{}", "a", "b");

        logger.close();

        let messages: Vec<(Level, String)> = entries
            .lock()
            .iter()
            .map(|e| (e.level, e.message.clone()))
            .collect();
        assert_eq!(
            messages,
            [
                (Level::Info, "Processing 3 items".to_string()),
                (Level::Warning, "plain".to_string()),
                (Level::Alert, "a-b".to_string()),
            ]
        );
    }

    #[test]
    fn test_macros_on_field_logger() {
        let logger = Logger::new();
        let scoped = logger.with_fields(crate::fields! { "k" => 1 });
        // Not open, so the entry is rejected rather than delivered
        crate::error!(scoped, "value: {}", 5);
        assert_eq!(logger.metrics().rejected_count(), 1);
    }
}
