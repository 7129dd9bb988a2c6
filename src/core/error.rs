//! Error types for the dispatcher and its targets

pub type Result<T> = std::result::Result<T, LoggerError>;

/// A target that failed to open, identified by its position in the logger's target list
#[derive(Debug)]
pub struct TargetFailure {
    pub index: usize,
    pub target: String,
    pub error: Box<LoggerError>,
}

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// `open` called on a logger whose dispatcher is already running
    #[error("Logger is already open")]
    AlreadyOpen,

    /// `open` called on a logger that has been closed
    #[error("Logger has been closed")]
    Closed,

    /// A single target refused to open
    #[error("Failed to open target '{target}': {message}")]
    TargetOpen { target: String, message: String },

    /// One or more targets failed to open; the remaining targets were started
    #[error("{}", summarize_failures(.failures))]
    TargetsFailed { failures: Vec<TargetFailure> },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Configuration names a target type nobody registered
    #[error("Unknown target type '{name}'")]
    UnknownTargetType { name: String },

    /// File target error with path
    #[error("File target error for '{path}': {message}")]
    FileTargetError { path: String, message: String },

    /// File rotation error
    #[error("File rotation failed for '{path}': {message}")]
    FileRotationError { path: String, message: String },

    /// File lock error
    #[error("Failed to acquire file lock on '{path}'")]
    FileLockError { path: String },

    /// Writer error (generic)
    #[error("Writer error: {0}")]
    WriterError(String),
}

fn summarize_failures(failures: &[TargetFailure]) -> String {
    let details = failures
        .iter()
        .map(|f| format!("#{} {}: {}", f.index, f.target, f.error))
        .collect::<Vec<_>>()
        .join("; ");
    format!("{} target(s) failed to open: {}", failures.len(), details)
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a target open error
    pub fn target_open(target: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::TargetOpen {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn unknown_target(name: impl Into<String>) -> Self {
        LoggerError::UnknownTargetType { name: name.into() }
    }

    /// Create a file target error
    pub fn file_target(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileTargetError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a file rotation error
    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileRotationError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a file lock error
    pub fn file_lock(path: impl Into<String>) -> Self {
        LoggerError::FileLockError { path: path.into() }
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::WriterError(msg.into())
    }

    /// Per-target failures carried by a partial open, empty for every other error
    pub fn failures(&self) -> &[TargetFailure] {
        match self {
            LoggerError::TargetsFailed { failures } => failures,
            _ => &[],
        }
    }
}
