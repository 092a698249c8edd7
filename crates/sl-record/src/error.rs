//! Error types for record invariants

/// A value violates one of the record model's invariants
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    /// Postal code is not exactly five ASCII digits
    #[error("invalid zip code '{0}': expected exactly five digits")]
    InvalidZip(String),

    /// Confidence value outside `[0, 1]` (or NaN)
    #[error("confidence {0} outside [0, 1]")]
    ConfidenceOutOfRange(f64),

    /// Position does not have exactly two finite components
    #[error("invalid position: {0}")]
    InvalidPosition(String),

    /// Material token is not part of the fixed vocabulary
    #[error("unknown material '{0}'")]
    UnknownMaterial(String),

    /// Identifier is empty
    #[error("record id must not be empty")]
    EmptyId,
}
