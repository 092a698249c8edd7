//! Loosely-typed records as they come out of extraction

use serde::{Deserialize, Serialize};

/// Which extraction pattern produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Full primary pattern match
    #[default]
    Primary,
    /// Permissive partial match
    Fallback,
    /// Structured tabular row
    Tabular,
}

/// A record before normalization and validation
///
/// Every field is optional: extraction never fails on missing data, the
/// validator decides whether the candidate is admissible.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Identifier (assigned by the normalizer when absent)
    pub id: Option<String>,
    /// Street-level address
    pub address: Option<String>,
    /// Locality
    pub town: Option<String>,
    /// Postal code as found in the source
    pub zip: Option<String>,
    /// Private-side material token as found in the source
    pub private_type: Option<String>,
    /// Public-side material token as found in the source
    pub public_type: Option<String>,
    /// Verified flag
    pub verified: Option<bool>,
    /// Intrinsic extraction confidence
    pub confidence: Option<f64>,
    /// Last verification date, `YYYY-MM-DD`
    pub last_verified: Option<String>,
    /// Pattern provenance
    #[serde(default)]
    pub match_kind: MatchKind,
}

impl CandidateRecord {
    /// Create empty candidate for the given match kind
    #[inline]
    #[must_use]
    pub fn new(match_kind: MatchKind) -> Self {
        Self {
            match_kind,
            ..Self::default()
        }
    }

    /// With address
    #[inline]
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// With town
    #[inline]
    #[must_use]
    pub fn with_town(mut self, town: impl Into<String>) -> Self {
        self.town = Some(town.into());
        self
    }

    /// With zip
    #[inline]
    #[must_use]
    pub fn with_zip(mut self, zip: impl Into<String>) -> Self {
        self.zip = Some(zip.into());
        self
    }

    /// With both material tokens
    #[inline]
    #[must_use]
    pub fn with_materials(mut self, private: impl Into<String>, public: impl Into<String>) -> Self {
        self.private_type = Some(private.into());
        self.public_type = Some(public.into());
        self
    }

    /// With verification metadata
    #[inline]
    #[must_use]
    pub fn with_verification(
        mut self,
        verified: bool,
        confidence: f64,
        last_verified: impl Into<String>,
    ) -> Self {
        self.verified = Some(verified);
        self.confidence = Some(confidence);
        self.last_verified = Some(last_verified.into());
        self
    }
}
