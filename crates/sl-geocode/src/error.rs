//! Error types for address resolution
//!
//! A [`ResolutionFailure`] never aborts a run: the resolver logs it and falls
//! through to the next strategy. [`SetupError`] covers resolver construction.

/// A single strategy attempt failed
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolutionFailure {
    /// Transport-level failure (connect, TLS, body read)
    #[error("request failed: {0}")]
    Http(String),

    /// Service answered with a non-success status
    #[error("service returned status {0}")]
    Status(u16),

    /// Response body did not have the expected shape
    #[error("could not decode response: {0}")]
    Decode(String),

    /// Request exceeded the configured timeout
    #[error("request timed out")]
    Timeout,

    /// Service returned coordinates outside the valid range
    #[error("invalid coordinates: {0}")]
    InvalidCoordinates(String),
}

impl ResolutionFailure {
    /// Check if a later attempt against the same service could succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout => true,
            Self::Status(code) => *code == 429 || *code >= 500,
            Self::Decode(_) | Self::InvalidCoordinates(_) => false,
        }
    }
}

impl From<reqwest::Error> for ResolutionFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Http(err.to_string())
        }
    }
}

/// Resolver could not be assembled from configuration
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// HTTP client construction failed
    #[error("http client setup failed: {0}")]
    Client(#[from] reqwest::Error),

    /// Configured service endpoint is unusable
    #[error("invalid service endpoint: {0}")]
    Endpoint(String),

    /// Custom centroid table entry is not a valid position
    #[error("invalid centroid for {zip}: {reason}")]
    Centroid {
        /// Postal code of the bad entry
        zip: String,
        /// Why it was rejected
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(ResolutionFailure::Timeout.is_retryable());
        assert!(ResolutionFailure::Status(503).is_retryable());
        assert!(ResolutionFailure::Status(429).is_retryable());
        assert!(!ResolutionFailure::Status(404).is_retryable());
        assert!(!ResolutionFailure::Decode("x".into()).is_retryable());
    }
}
