//! Pipeline error taxonomy
//!
//! Only run-level conditions surface as [`PipelineError`] from the public
//! operations. Per-record conditions (`SchemaViolation`,
//! `ResolutionFailure`) are caught, counted and logged where they occur;
//! their variants exist so callers can classify them uniformly.

use sl_geocode::{ResolutionFailure, SetupError};
use sl_ingest::{IngestError, SchemaViolation};
use sl_store::StoreError;
use std::path::PathBuf;

/// Main pipeline error type
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Required source or store file is absent
    #[error("required input not found: {}", .0.display())]
    MissingInput(PathBuf),

    /// Input exists but cannot be read or decoded
    #[error("unreadable input {}: {reason}", path.display())]
    UnreadableInput {
        /// Offending file
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// Source could not be parsed as configured
    #[error("ingest failed: {0}")]
    Ingest(#[from] IngestError),

    /// A candidate failed validation
    ///
    /// Classification only: ingest skips and counts violations and never
    /// returns this variant.
    #[error(transparent)]
    SchemaViolation(#[from] SchemaViolation),

    /// A resolution strategy failed
    ///
    /// Classification only: the resolver falls through to the next strategy
    /// and the scheduler never returns this variant.
    #[error("resolution failed: {0}")]
    ResolutionFailure(#[from] ResolutionFailure),

    /// Store could not be written
    #[error("persistence failed: {0}")]
    PersistenceFailure(#[source] StoreError),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Run stopped by cancellation before completion
    #[error("operation cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Check if the error terminates the run
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingInput(_)
                | Self::UnreadableInput { .. }
                | Self::Ingest(_)
                | Self::PersistenceFailure(_)
                | Self::Config(_)
        )
    }

    /// Process exit code for this error
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Cancelled => 130,
            _ => 1,
        }
    }

    /// Create configuration error
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Missing(path) => Self::MissingInput(path),
            StoreError::Read { ref path, .. } | StoreError::Decode { ref path, .. } => {
                Self::UnreadableInput {
                    path: path.clone(),
                    reason: err.to_string(),
                }
            }
            other => Self::PersistenceFailure(other),
        }
    }
}

impl From<SetupError> for PipelineError {
    fn from(err: SetupError) -> Self {
        Self::Config(err.to_string())
    }
}
