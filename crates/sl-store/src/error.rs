//! Error types for store access

use std::path::PathBuf;

/// Store read/write failures
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Store file does not exist
    #[error("store not found: {}", .0.display())]
    Missing(PathBuf),

    /// Store file exists but cannot be read
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Store contents are not a valid record array
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        /// File path
        path: PathBuf,
        /// Underlying decode error
        #[source]
        source: serde_json::Error,
    },

    /// Records could not be serialized
    #[error("failed to encode records: {0}")]
    Encode(#[source] serde_json::Error),

    /// Temporary file could not be created or written
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// Target path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Temporary file could not be renamed over the target
    #[error("failed to replace {}: {source}", path.display())]
    Persist {
        /// Target path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Check if the error happened while writing
    ///
    /// Write-side failures never leave a partially written target.
    #[inline]
    #[must_use]
    pub fn is_persistence_failure(&self) -> bool {
        matches!(
            self,
            Self::Encode(_) | Self::Write { .. } | Self::Persist { .. }
        )
    }

    /// Check if the store file was absent
    #[inline]
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing(_))
    }
}
