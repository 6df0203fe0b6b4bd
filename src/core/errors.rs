//! Shared error types for the migration engine

use std::ops::Range;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for typelift operations
#[derive(Debug, Error)]
pub enum Error {
    /// Two edits claim overlapping spans of the original text. This is a bug
    /// in the transform that produced them and aborts the whole file.
    #[error("overlapping edits: {first:?} overlaps {second:?}")]
    OverlappingEdits {
        first: Range<usize>,
        second: Range<usize>,
    },

    /// An edit points outside the original text or into a UTF-8 sequence
    #[error("edit at byte {index} is outside the source text (len {len})")]
    EditOutOfBounds { index: usize, len: usize },

    /// Tree-sitter could not produce a tree at all
    #[error("Parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Wrapped external errors
    #[error(transparent)]
    External(#[from] anyhow::Error),

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// TOML errors
    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a parse error for a file
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Whether this error signals a defect in a transform rather than bad input
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::OverlappingEdits { .. } | Self::EditOutOfBounds { .. }
        )
    }
}

/// Result type alias for typelift operations
pub type Result<T> = std::result::Result<T, Error>;
