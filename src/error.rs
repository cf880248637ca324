// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Error types for the copy engine.
//!
//! This module defines the run-fatal error type. Every variant here aborts
//! the whole run: per-object store failures are a different animal
//! ([`StoreError`](crate::store::StoreError)) and are routed to the failure
//! log by the workers instead of being raised through `Result`.
//!
//! # Error Categories
//!
//! | Error Type | Input-side | Description |
//! |------------|------------|-------------|
//! | `Input` | Yes | Difference list unreadable (missing file, I/O failure) |
//! | `Parse` | Yes | Malformed difference record (bad JSON, empty key) |
//! | `Log` | No | Outcome log could not be opened, written, or flushed |
//! | `InvalidState` | No | Engine state machine violation |
//! | `Internal` | No | Unexpected internal error |
//!
//! # Recovery Behavior
//!
//! Use [`CopyError::is_input_error()`] to determine whether the problem lies
//! with the difference list (fix the file and rerun) or with the run
//! environment (disk trouble or a caller bug; rerunning the same input will
//! not help).

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for copy-run operations.
pub type Result<T> = std::result::Result<T, CopyError>;

/// Errors that abort a copy run.
///
/// Each variant includes context about where the error occurred.
/// Use [`is_input_error()`](Self::is_input_error) to check whether the
/// difference list itself is at fault.
#[derive(Error, Debug)]
pub enum CopyError {
    /// Difference list I/O error.
    ///
    /// Occurs when the input file cannot be opened or read.
    /// The run aborts without processing further records.
    #[error("Diff list error ({}): {source}", .path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed difference record.
    ///
    /// Occurs when a line past the skip-prefix is not a valid record
    /// (invalid JSON, or a record with an empty key). The run aborts
    /// rather than continuing with partial data.
    #[error("Malformed diff record at line {line}: {message}")]
    Parse { line: u64, message: String },

    /// Outcome log I/O error.
    ///
    /// Occurs when either outcome log cannot be opened, written, or
    /// flushed. Fatal to the run: outcome logs must not silently lose
    /// entries.
    #[error("Outcome log error ({operation} {}): {source}", .path.display())]
    Log {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Engine state machine violation.
    ///
    /// Occurs when an operation is attempted in the wrong state
    /// (e.g., calling `run()` on an engine that already ran).
    /// Indicates a bug in the caller.
    #[error("Invalid state: expected {expected}, got {actual}")]
    InvalidState { expected: String, actual: String },

    /// Unexpected internal error.
    ///
    /// Catch-all for errors that shouldn't happen (a pipeline task
    /// panicking, for example). Indicates a bug that needs investigation.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CopyError {
    /// Create an input error for the given diff list path
    pub fn input(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Input {
            path: path.into(),
            source,
        }
    }

    /// Create a parse error for the given 1-based line number
    pub fn parse(line: u64, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    /// Create an outcome log error ("open", "write", "flush")
    pub fn log_io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Log {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Check whether the difference list itself is at fault
    pub fn is_input_error(&self) -> bool {
        match self {
            Self::Input { .. } => true,
            Self::Parse { .. } => true,
            Self::Log { .. } => false, // Local disk issues need attention
            Self::InvalidState { .. } => false,
            Self::Internal(_) => false,
        }
    }
}
