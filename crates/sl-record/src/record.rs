//! The canonical service line record and its field newtypes

use crate::error::RecordError;
use crate::geocode::{Geocode, GeocodeSource, Position};
use crate::material::Material;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Stable record identifier, unique within a store
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Create identifier from a non-empty string
    ///
    /// # Errors
    /// `RecordError::EmptyId` when `id` is blank
    pub fn new(id: impl Into<String>) -> Result<Self, RecordError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(RecordError::EmptyId);
        }
        Ok(Self(id))
    }

    /// Borrow as str
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RecordId {
    type Error = RecordError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Five-digit postal code
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct ZipCode(String);

impl ZipCode {
    /// Parse a postal code, requiring exactly five ASCII digits
    ///
    /// # Errors
    /// `RecordError::InvalidZip` for anything else (no trimming is applied)
    pub fn parse(raw: &str) -> Result<Self, RecordError> {
        if raw.len() == 5 && raw.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(raw.to_string()))
        } else {
            Err(RecordError::InvalidZip(raw.to_string()))
        }
    }

    /// Borrow as str
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ZipCode {
    type Error = RecordError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ZipCode> for String {
    fn from(zip: ZipCode) -> Self {
        zip.0
    }
}

impl std::fmt::Display for ZipCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Score in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Confidence(f64);

impl Confidence {
    /// Full confidence
    pub const CERTAIN: Confidence = Confidence(1.0);

    /// Create, rejecting values outside `[0, 1]`
    ///
    /// # Errors
    /// `RecordError::ConfidenceOutOfRange` for out-of-range or NaN input
    pub fn new(value: f64) -> Result<Self, RecordError> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(RecordError::ConfidenceOutOfRange(value))
        }
    }

    /// Create, clamping into `[0, 1]` (NaN becomes 0)
    #[inline]
    #[must_use]
    pub fn clamped(value: f64) -> Self {
        if value.is_nan() {
            Self(0.0)
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    /// Raw value
    #[inline]
    #[must_use]
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Confidence {
    type Error = RecordError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Confidence> for f64 {
    fn from(c: Confidence) -> Self {
        c.0
    }
}

/// One property's service line, as persisted in the canonical store
///
/// Created unresolved by ingest; only the scheduler adds `position`,
/// `geocode_source` and `geocode_confidence`, always together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceLineRecord {
    /// Stable identifier
    pub id: RecordId,
    /// Street-level address, never empty
    pub address: String,
    /// Locality name, when the source carries one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub town: Option<String>,
    /// Postal code
    pub zip: ZipCode,
    /// Material on the property-owner side
    pub private_type: Material,
    /// Material on the utility side
    pub public_type: Material,
    /// Field-verified flag, independent of geocoding
    pub verified: bool,
    /// Record-quality confidence
    pub confidence: Confidence,
    /// Date of last verification
    pub last_verified: NaiveDate,
    /// `[longitude, latitude]` once resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// Strategy that produced `position`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geocode_source: Option<GeocodeSource>,
    /// Strategy precision
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geocode_confidence: Option<Confidence>,
}

impl ServiceLineRecord {
    /// Whether a resolver strategy has already produced this record's position
    ///
    /// Resolved records are never re-processed or overwritten.
    #[inline]
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.geocode_source.is_some()
    }

    /// Attach a resolution result
    pub fn apply_geocode(&mut self, geocode: Geocode) {
        self.position = Some(geocode.position);
        self.geocode_source = Some(geocode.source);
        self.geocode_confidence = Some(geocode.confidence);
    }

    /// Resolution provenance, if any
    #[must_use]
    pub fn geocode(&self) -> Option<Geocode> {
        Some(Geocode {
            position: self.position?,
            source: self.geocode_source.clone()?,
            confidence: self.geocode_confidence?,
        })
    }

    /// Whether either side contains lead or galvanized pipe
    #[inline]
    #[must_use]
    pub fn requires_replacement(&self) -> bool {
        [self.private_type, self.public_type]
            .iter()
            .any(|m| matches!(m, Material::Lead | Material::Galvanized))
    }
}
