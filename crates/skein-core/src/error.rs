//! Error types for Skein operations.
//!
//! This module provides a common `Error` type and `Result<T>` alias used across
//! all Skein crates. Uses `thiserror` for derive macros.
//!
//! # Propagation
//!
//! - Backend failures surface as [`Error::EmbeddingBackend`] and are never
//!   retried at this layer.
//! - Unequal vector lengths are reported as [`Error::DimensionMismatch`] only
//!   when persisted data is explicitly validated; similarity scoring treats
//!   them as a score of zero instead.
//! - Cache failures are reported as [`Error::Cache`] so callers can degrade to
//!   a backend call rather than failing a batch.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur in Skein operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O error with the path that caused it.
    #[error("I/O error at {path}: {source}")]
    IoWithPath {
        /// Underlying I/O error.
        source: std::io::Error,
        /// Path being read or written.
        path: PathBuf,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Content not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data or format.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The embedding backend returned no data or malformed data.
    #[error("Embedding backend error: {0}")]
    EmbeddingBackend(String),

    /// Two vectors that must share a dimension do not.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected vector length.
        expected: usize,
        /// Actual vector length.
        actual: usize,
    },

    /// A search query violates its invariants.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Embedding cache lookup or write failed.
    #[error("Cache error: {0}")]
    Cache(String),

    /// Generic operation failure.
    #[error("Operation failed: {0}")]
    Operation(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid data error.
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    /// Create an embedding backend error.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::EmbeddingBackend(msg.into())
    }

    /// Create a dimension mismatch error.
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    /// Create an invalid query error.
    pub fn invalid_query(msg: impl Into<String>) -> Self {
        Self::InvalidQuery(msg.into())
    }

    /// Create a cache error.
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }

    /// Create a generic operation error.
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// Wrap an I/O error together with the offending path.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Self::IoWithPath {
            source,
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Whether this error originated in the embedding backend.
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::EmbeddingBackend(_))
    }

    /// Whether this error is a missing resource.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether this error is an invalid query.
    pub fn is_invalid_query(&self) -> bool {
        matches!(self, Self::InvalidQuery(_))
    }

    /// Whether this error is a dimension mismatch.
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(self, Self::DimensionMismatch { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias using Skein's Error type.
pub type Result<T> = std::result::Result<T, Error>;

// ============================================================================
// Tests
// ============================================================================
