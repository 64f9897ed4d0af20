//! Error types for the editor core

use serde::{Deserialize, Serialize};

/// Error type for the few operations that can fail loudly.
///
/// Editing operations never return this: they report "nothing changed" through `Option`/`bool`
/// instead. Only loading a project and parsing identifiers surface errors to the caller.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum EditorError {
    /// Identifier string is not a valid UUID
    #[error("Invalid {kind} id: {value}")]
    InvalidId { kind: String, value: String },

    /// Path command carries the wrong number of points for its type
    #[error("Path command '{command}' expects {expected} point(s), got {actual}")]
    InvalidPathCommand {
        command: String,
        expected: usize,
        actual: usize,
    },

    /// Project structure violates a timeline invariant
    #[error("Invalid document: {reason}")]
    InvalidDocument { reason: String },

    /// Unsupported project format version
    #[error("Unsupported project version: {version}")]
    UnsupportedVersion { version: String },

    /// Serialization error
    #[error("Serialization error: {reason}")]
    Serialization { reason: String },
}

impl EditorError {
    /// Shorthand for structural load failures.
    pub fn invalid_document(reason: impl Into<String>) -> Self {
        Self::InvalidDocument {
            reason: reason.into(),
        }
    }

    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidId { .. } | Self::InvalidPathCommand { .. } => "validation",
            Self::InvalidDocument { .. } | Self::UnsupportedVersion { .. } => "document",
            Self::Serialization { .. } => "serialization",
        }
    }
}

impl From<serde_json::Error> for EditorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}
