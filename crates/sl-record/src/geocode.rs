//! Coordinates and resolution provenance

use crate::error::RecordError;
use crate::record::Confidence;
use serde::{Deserialize, Serialize};

/// Provenance tag written by the locality-centroid strategy
pub const ZIP_FALLBACK_TAG: &str = "zip_fallback";

const SIMPLIFIED_SUFFIX: &str = "_simplified";

/// Geographic point, serialized as `[longitude, latitude]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "[f64; 2]")]
pub struct Position {
    longitude: f64,
    latitude: f64,
}

impl Position {
    /// Create a position from WGS84 degrees
    ///
    /// # Errors
    /// `RecordError::InvalidPosition` when a component is not finite or is
    /// outside the valid degree range.
    pub fn new(longitude: f64, latitude: f64) -> Result<Self, RecordError> {
        if !longitude.is_finite() || !latitude.is_finite() {
            return Err(RecordError::InvalidPosition(format!(
                "non-finite component [{longitude}, {latitude}]"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) || !(-90.0..=90.0).contains(&latitude) {
            return Err(RecordError::InvalidPosition(format!(
                "out of range [{longitude}, {latitude}]"
            )));
        }
        Ok(Self {
            longitude,
            latitude,
        })
    }

    /// Longitude in degrees
    #[inline]
    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Latitude in degrees
    #[inline]
    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Largest per-axis distance to `other`, in degrees
    #[inline]
    #[must_use]
    pub fn max_axis_delta(&self, other: &Position) -> f64 {
        (self.longitude - other.longitude)
            .abs()
            .max((self.latitude - other.latitude).abs())
    }
}

impl TryFrom<Vec<f64>> for Position {
    type Error = RecordError;

    fn try_from(value: Vec<f64>) -> Result<Self, Self::Error> {
        match value.as_slice() {
            [lng, lat] => Position::new(*lng, *lat),
            other => Err(RecordError::InvalidPosition(format!(
                "expected 2 components, got {}",
                other.len()
            ))),
        }
    }
}

impl From<Position> for [f64; 2] {
    fn from(p: Position) -> Self {
        [p.longitude, p.latitude]
    }
}

/// Which resolution strategy produced a record's position
///
/// Serialized as a flat string tag: the service name for primary hits,
/// `<service>_simplified` for simplified-query hits and `zip_fallback` for
/// centroid fallbacks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GeocodeSource {
    /// Full query against a street-level service
    Primary(String),
    /// Simplified query against a street-level service
    Simplified(String),
    /// Locality centroid table
    ZipFallback,
}

impl GeocodeSource {
    /// Whether the position came from the centroid fallback
    #[inline]
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::ZipFallback)
    }

    /// Service that answered, if any
    #[must_use]
    pub fn service(&self) -> Option<&str> {
        match self {
            Self::Primary(s) | Self::Simplified(s) => Some(s),
            Self::ZipFallback => None,
        }
    }
}

impl std::fmt::Display for GeocodeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary(service) => f.write_str(service),
            Self::Simplified(service) => write!(f, "{service}{SIMPLIFIED_SUFFIX}"),
            Self::ZipFallback => f.write_str(ZIP_FALLBACK_TAG),
        }
    }
}

impl From<String> for GeocodeSource {
    fn from(tag: String) -> Self {
        if tag == ZIP_FALLBACK_TAG {
            return Self::ZipFallback;
        }
        match tag.strip_suffix(SIMPLIFIED_SUFFIX) {
            Some(service) if !service.is_empty() => Self::Simplified(service.to_string()),
            _ => Self::Primary(tag),
        }
    }
}

impl From<GeocodeSource> for String {
    fn from(source: GeocodeSource) -> Self {
        source.to_string()
    }
}

/// A successful resolution ready to be attached to a record
#[derive(Debug, Clone, PartialEq)]
pub struct Geocode {
    /// Resolved point
    pub position: Position,
    /// Strategy provenance
    pub source: GeocodeSource,
    /// Strategy precision (distinct from record confidence)
    pub confidence: Confidence,
}
