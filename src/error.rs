//! Error types for Facewatch
//!
//! Setup-time misconfiguration (schema, schedule period, graph layout) is
//! surfaced immediately. Steady-state failures (capture, missing data, a
//! single job) are reported and isolated by the caller.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Facewatch error types
#[derive(Error, Debug)]
pub enum Error {
    /// Criteria schema mutation attempted after rows were recorded
    #[error("Schema locked: {rows} row(s) already tracked\nDeclare every metric before the loop starts")]
    SchemaLocked {
        /// Rows buffered at the time of the attempt
        rows: usize,
    },

    /// Tracked keys do not match the declared schema
    #[error("Schema mismatch: expected {expected:?}, got {got:?}")]
    SchemaMismatch {
        /// Declared metric names (schema order)
        expected: Vec<String>,
        /// Names that were supplied
        got: Vec<String>,
    },

    /// Scheduler configured with an unknown period
    #[error("Unsupported period {0:?}: scheduler only supports one of [second, minute, hour, day]")]
    UnsupportedPeriod(String),

    /// Graph registration is inconsistent with the schema
    #[error("Invalid graph: {0}")]
    InvalidGraph(String),

    /// No segment has been written yet
    #[error("No data: no segment found in {}", .0.display())]
    NoData(PathBuf),

    /// Transient frame capture failure
    #[error("Capture failure: {0}")]
    CaptureFailure(String),

    /// A scheduled job callback failed
    #[error("Scheduled job '{job}' failed: {message}")]
    JobFailed {
        /// Job label
        job: String,
        /// Failure description
        message: String,
    },

    /// Invalid argument or configuration value
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Storage error (segment files)
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Configuration file could not be loaded
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the loop should keep running after this error.
    ///
    /// Capture failures, missing data and job failures are steady-state
    /// conditions; everything else points at misconfiguration or a broken
    /// environment.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::CaptureFailure(_) | Self::NoData(_) | Self::JobFailed { .. }
        )
    }
}
