//! Error types for the ingest stages
//!
//! - [`SchemaViolation`]: one candidate is inadmissible (recovered by skipping it)
//! - [`IngestError`]: the source itself cannot be read as configured

/// Record field named in a schema violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// `id`
    Id,
    /// `address`
    Address,
    /// `zip`
    Zip,
    /// `private_type`
    PrivateType,
    /// `public_type`
    PublicType,
    /// `verified`
    Verified,
    /// `confidence`
    Confidence,
    /// `last_verified`
    LastVerified,
}

impl Field {
    /// Required fields in validation order
    pub const REQUIRED: [Field; 8] = [
        Field::Id,
        Field::Address,
        Field::Zip,
        Field::PrivateType,
        Field::PublicType,
        Field::Verified,
        Field::Confidence,
        Field::LastVerified,
    ];

    /// Schema field name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Address => "address",
            Field::Zip => "zip",
            Field::PrivateType => "private_type",
            Field::PublicType => "public_type",
            Field::Verified => "verified",
            Field::Confidence => "confidence",
            Field::LastVerified => "last_verified",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a field was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationReason {
    /// Field absent or blank
    Missing,
    /// Field present but malformed
    Invalid(String),
}

impl std::fmt::Display for ViolationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => f.write_str("missing required field"),
            Self::Invalid(detail) => write!(f, "invalid value: {detail}"),
        }
    }
}

/// A candidate failed schema validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("schema violation on '{field}': {reason}")]
pub struct SchemaViolation {
    /// First offending field
    pub field: Field,
    /// What was wrong with it
    pub reason: ViolationReason,
}

impl SchemaViolation {
    /// Field was absent
    #[inline]
    #[must_use]
    pub fn missing(field: Field) -> Self {
        Self {
            field,
            reason: ViolationReason::Missing,
        }
    }

    /// Field was malformed
    #[inline]
    #[must_use]
    pub fn invalid(field: Field, detail: impl Into<String>) -> Self {
        Self {
            field,
            reason: ViolationReason::Invalid(detail.into()),
        }
    }
}

/// Source-level ingest failures
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Extraction pattern failed to compile (bad locality configuration)
    #[error("invalid extraction pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Tabular source could not be read
    #[error("tabular source error: {0}")]
    Csv(#[from] csv::Error),

    /// Tabular source lacks a required column
    #[error("tabular source has no '{0}' column")]
    MissingColumn(&'static str),
}
