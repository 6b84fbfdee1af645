//! Structured error types for the seqmill crates.

use thiserror::Error;

/// Unified error type for all seqmill operations.
#[derive(Debug, Error)]
pub enum SeqmillError {
    /// I/O error (file not found, unreadable stream, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input text does not match the grammar of its declared format
    #[error("format error: {0}")]
    Format(String),

    /// Operation invoked on a collection whose alphabet it cannot handle
    #[error("alphabet mismatch: {0}")]
    AlphabetMismatch(String),

    /// Caller-supplied numeric range is invalid
    #[error("range error: {0}")]
    Range(String),

    /// A parsed source produced no usable records
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// Invalid argument (unknown format name, organism, pattern, ...)
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl SeqmillError {
    /// Shorthand for the alphabet guard used at operation boundaries.
    pub fn alphabet(operation: &str, detail: impl std::fmt::Display) -> Self {
        SeqmillError::AlphabetMismatch(format!("{operation}: {detail}"))
    }
}

/// Convenience alias used throughout the seqmill crates.
pub type Result<T> = std::result::Result<T, SeqmillError>;
