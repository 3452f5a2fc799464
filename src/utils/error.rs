//! Error handling for table markup and the command line
//!
//! Normalization and commands never fail: structural problems are repaired
//! and impossible requests are no-ops. Only reading markup and doing file IO
//! produce errors.

use std::fmt;

/// Table error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// Markup could not be read
    Parse {
        message: String,
        /// Byte offset into the input
        position: Option<usize>,
    },
    /// Input is well formed but not usable (e.g. contains no table)
    InvalidInput { message: String },
    /// IO error (for file operations)
    Io { message: String },
    /// Internal error
    Internal { message: String },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::Parse { message, position } => match position {
                Some(pos) => write!(f, "Parse error at byte {}: {}", pos, message),
                None => write!(f, "Parse error: {}", message),
            },
            TableError::InvalidInput { message } => write!(f, "Invalid input: {}", message),
            TableError::Io { message } => write!(f, "IO error: {}", message),
            TableError::Internal { message } => write!(f, "Internal error: {}", message),
        }
    }
}

impl std::error::Error for TableError {}

impl From<std::io::Error> for TableError {
    fn from(err: std::io::Error) -> Self {
        TableError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type for table operations
pub type TableResult<T> = Result<T, TableError>;

// Convenience constructors for errors
impl TableError {
    pub fn parse(message: impl Into<String>) -> Self {
        TableError::Parse {
            message: message.into(),
            position: None,
        }
    }

    pub fn parse_at(message: impl Into<String>, position: usize) -> Self {
        TableError::Parse {
            message: message.into(),
            position: Some(position),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        TableError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        TableError::Internal {
            message: message.into(),
        }
    }
}
