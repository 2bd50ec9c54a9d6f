//! Centralized error types for newsgraph.

use thiserror::Error;

/// Main error type for newsgraph operations.
#[derive(Error, Debug)]
pub enum NewsGraphError {
    #[error("Graph store unreachable: {0}")]
    Connectivity(String),

    #[error("Graph store error while {context}: {message}")]
    Store { context: String, message: String },

    #[error("Cannot create uniqueness constraint on :{label}: {message}")]
    SchemaConflict { label: String, message: String },

    #[error("Malformed row in {source_name} at line {line}: {message}")]
    MalformedRow {
        source_name: String,
        line: u64,
        message: String,
    },

    #[error("Source unavailable: {location}: {message}")]
    SourceUnavailable { location: String, message: String },

    #[error("Question-answering agent failed: {0}")]
    Agent(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for newsgraph operations.
pub type NewsGraphResult<T> = Result<T, NewsGraphError>;

impl NewsGraphError {
    /// Create a store error for a failed write or read.
    pub fn store(context: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Store {
            context: context.into(),
            message: err.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether retrying the whole operation may change the outcome.
    ///
    /// Malformed rows count as transient: a bad row fails the enclosing bulk
    /// write exactly like a dropped connection does, and the loader keeps
    /// retrying until its attempt budget runs out.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::SchemaConflict { .. } | Self::Config(_))
    }
}

impl crate::retry::Transient for NewsGraphError {
    fn is_transient(&self) -> bool {
        NewsGraphError::is_transient(self)
    }
}
