//! Target trait for log output destinations

use super::entry::Entry;
use super::error::Result;
use super::level::Level;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::io::Write;
use std::sync::Arc;

/// Sink for diagnostics a target cannot return to a caller
///
/// Targets receive the writer in [`Target::open`] and report asynchronous I/O
/// failures on it instead of panicking or dropping them silently.
pub type ErrorWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Error writer backed by the process's standard error
pub fn stderr_writer() -> ErrorWriter {
    Arc::new(Mutex::new(Box::new(std::io::stderr())))
}

/// Write one diagnostic line, ignoring failures of the writer itself
pub fn report(errors: &ErrorWriter, message: impl std::fmt::Display) {
    let mut writer = errors.lock();
    let _ = writeln!(writer, "{}", message);
    let _ = writer.flush();
}

/// What the dispatcher hands to a target
#[derive(Debug, Clone)]
pub enum Record {
    /// A formatted entry, shared by every target
    Entry(Arc<Entry>),
    /// No more entries will follow; drain everything buffered
    Flush,
}

impl Record {
    pub fn entry(&self) -> Option<&Entry> {
        match self {
            Record::Entry(entry) => Some(entry),
            Record::Flush => None,
        }
    }

    pub fn is_flush(&self) -> bool {
        matches!(self, Record::Flush)
    }
}

/// Upcast helper so configured targets can be inspected after the fact
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A pluggable log sink
///
/// The dispatcher calls every method from its own thread, one call at a
/// time. `process` must not block on I/O: a target that writes somewhere slow
/// hands the entry to its own worker and returns.
pub trait Target: AsAny + Send {
    fn name(&self) -> &str;

    /// Prepare for a session; an error keeps the target out of it
    fn open(&mut self, errors: ErrorWriter) -> Result<()>;

    /// Accept the next record. `Record::Flush` arrives exactly once, last.
    fn process(&mut self, record: Record);

    /// Block until everything accepted so far is written and resources are released
    fn close(&mut self);
}

impl dyn Target {
    pub fn downcast_ref<T: Target>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

impl std::fmt::Debug for dyn Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Target").field("name", &self.name()).finish()
    }
}

/// Per-target entry filter
///
/// An empty category list accepts every category. A pattern ending in `*`
/// matches by prefix, any other pattern must match exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filter {
    pub max_level: Level,
    pub categories: Vec<String>,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            max_level: Level::Debug,
            categories: Vec::new(),
        }
    }
}

impl Filter {
    pub fn new(max_level: Level) -> Self {
        Self {
            max_level,
            categories: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn allows(&self, entry: &Entry) -> bool {
        entry.level.passes(self.max_level) && self.allows_category(&entry.category)
    }

    fn allows_category(&self, category: &str) -> bool {
        if self.categories.is_empty() {
            return true;
        }
        self.categories.iter().any(|pattern| match pattern.strip_suffix('*') {
            Some(prefix) => category.starts_with(prefix),
            None => pattern == category,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named;

    impl Target for Named {
        fn name(&self) -> &str {
            "named"
        }
        fn open(&mut self, _errors: ErrorWriter) -> Result<()> {
            Ok(())
        }
        fn process(&mut self, _record: Record) {}
        fn close(&mut self) {}
    }

    #[test]
    fn test_filter_defaults_accept_everything() {
        let filter = Filter::default();
        assert!(filter.allows(&Entry::new(Level::Debug, "anything", "m")));
    }

    #[test]
    fn test_filter_level_and_categories() {
        let filter = Filter::new(Level::Warning).with_categories(["db.*", "http"]);

        assert!(filter.allows(&Entry::new(Level::Error, "db.pool", "m")));
        assert!(filter.allows(&Entry::new(Level::Warning, "http", "m")));
        assert!(!filter.allows(&Entry::new(Level::Info, "http", "m")));
        assert!(!filter.allows(&Entry::new(Level::Error, "https", "m")));
        assert!(!filter.allows(&Entry::new(Level::Error, "cache", "m")));
    }

    #[test]
    fn test_downcast_ref() {
        let target: Box<dyn Target> = Box::new(Named);
        assert!(target.downcast_ref::<Named>().is_some());
        assert_eq!(target.name(), "named");
    }

    #[test]
    fn test_boxed_target_debug_shows_name() {
        let target: Box<dyn Target> = Box::new(Named);
        assert_eq!(format!("{:?}", target), "Target { name: \"named\" }");

        let failed: Result<Box<dyn Target>> = Err(crate::core::LoggerError::unknown_target("x"));
        assert!(failed.unwrap_err().to_string().contains("x"));
    }

    #[test]
    fn test_report_writes_line() {
        let buffer = Arc::new(Mutex::new(Vec::<u8>::new()));

        struct Shared(Arc<Mutex<Vec<u8>>>);
        impl Write for Shared {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().extend_from_slice(buf);
                Ok(buf.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let writer: ErrorWriter = Arc::new(Mutex::new(Box::new(Shared(Arc::clone(&buffer)))));
        report(&writer, "[LOGGER ERROR] disk full");
        assert_eq!(
            String::from_utf8(buffer.lock().clone()).unwrap(),
            "[LOGGER ERROR] disk full\n"
        );
    }
}
