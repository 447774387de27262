//! Error types for the lifecycle engine.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Comprehensive error type for all engine and store operations.
///
/// Messages produced by `Display` are safe to surface to callers: storage
/// failures only expose a short description, the underlying driver error is
/// reachable through [`std::error::Error::source`] for logging.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The snapshot provider could not retrieve the target
    #[error("Could not fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
    /// An insight, plan or evaluation collaborator failed
    #[error("{stage} failed: {reason}")]
    Generation { stage: Stage, reason: String },
    /// A collaborator call was cancelled by the caller's deadline
    #[error("{stage} timed out")]
    ExternalTimeout { stage: Stage },
    /// Storage read or write failure
    #[error("Persistence error: {message}")]
    Persistence {
        message: String,
        #[source]
        source: rusqlite::Error,
    },
    /// Analysis not found for the given ID
    #[error("Analysis {id} not found")]
    AnalysisNotFound { id: String },
    /// Task not found for the given ID
    #[error("Task {id} not found")]
    TaskNotFound { id: String },
    /// The caller does not own the referenced record
    #[error("Not authorized to access this {resource}")]
    Unauthorized { resource: &'static str },
    /// Invalid caller input
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    /// A structured payload failed boundary validation
    #[error("Invalid {kind} payload: {reason}")]
    InvalidPayload { kind: &'static str, reason: String },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// XDG directory specification errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
    /// A blocking database task panicked or was cancelled
    #[error("Internal error: {message}")]
    Internal { message: String },
    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

/// External collaborator stage a failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Snapshot,
    Insight,
    Plan,
    Evaluation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Snapshot => "Website fetch",
            Stage::Insight => "Analysis generation",
            Stage::Plan => "Plan generation",
            Stage::Evaluation => "Task evaluation",
        })
    }
}

/// Coarse error category for callers that branch on failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Fetch,
    Generation,
    ExternalTimeout,
    Persistence,
    NotFound,
    Unauthorized,
    InvalidInput,
    Internal,
}

/// Builder for creating persistence errors with optional context.
pub struct PersistenceErrorBuilder {
    message: String,
}

impl PersistenceErrorBuilder {
    /// Create a new persistence error builder with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build the error with the given source.
    pub fn with_source(self, source: rusqlite::Error) -> EngineError {
        EngineError::Persistence {
            message: self.message,
            source,
        }
    }
}

/// Builder for creating input validation errors.
pub struct InvalidInputBuilder {
    field: String,
}

impl InvalidInputBuilder {
    /// Create a new invalid input error builder for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Build the error with the given reason.
    pub fn with_reason(self, reason: impl Into<String>) -> EngineError {
        EngineError::InvalidInput {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl EngineError {
    /// Creates a builder for persistence errors.
    pub fn persistence(message: impl Into<String>) -> PersistenceErrorBuilder {
        PersistenceErrorBuilder::new(message)
    }

    /// Creates a builder for input validation errors.
    pub fn invalid_input(field: impl Into<String>) -> InvalidInputBuilder {
        InvalidInputBuilder::new(field)
    }

    /// Returns the failure category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Fetch { .. } => ErrorKind::Fetch,
            EngineError::Generation { .. } => ErrorKind::Generation,
            EngineError::ExternalTimeout { .. } => ErrorKind::ExternalTimeout,
            EngineError::Persistence { .. } => ErrorKind::Persistence,
            EngineError::AnalysisNotFound { .. } | EngineError::TaskNotFound { .. } => {
                ErrorKind::NotFound
            }
            EngineError::Unauthorized { .. } => ErrorKind::Unauthorized,
            EngineError::InvalidInput { .. } | EngineError::InvalidPayload { .. } => {
                ErrorKind::InvalidInput
            }
            EngineError::FileSystem { .. }
            | EngineError::XdgDirectory(_)
            | EngineError::Configuration { .. }
            | EngineError::Internal { .. }
            | EngineError::Serialization { .. } => ErrorKind::Internal,
        }
    }

    pub(crate) fn join(error: tokio::task::JoinError) -> Self {
        EngineError::Internal {
            message: format!("Task join error: {error}"),
        }
    }
}

/// Specialized extension trait for database-related Results.
pub trait DatabaseResultExt<T> {
    /// Map database errors with a message.
    fn db_context(self, message: &str) -> Result<T>;
}

impl<T> DatabaseResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn db_context(self, message: &str) -> Result<T> {
        self.map_err(|e| EngineError::persistence(message).with_source(e))
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
