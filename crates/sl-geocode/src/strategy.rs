//! Resolution strategy trait and the built-in strategies
//!
//! Provides the [`ResolutionStrategy`] trait the [`Resolver`] threads an
//! address through, in decreasing order of precision:
//!
//! 1. [`PrimaryQuery`]: full query against a street-level service
//! 2. [`SimplifiedQuery`]: house number and suffix tokens stripped, same service
//! 3. [`CentroidFallback`]: postal-code centroid plus bounded jitter
//!
//! [`Resolver`]: crate::Resolver

use crate::centroid::CentroidTable;
use crate::error::ResolutionFailure;
use crate::query::AddressQuery;
use crate::service::GeocodingService;
use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sl_record::{Confidence, Geocode, GeocodeSource, Position};
use std::sync::Arc;

/// Largest centroid jitter, in degrees per axis
pub const MAX_JITTER_DEGREES: f64 = 0.005;

/// Lowest permitted centroid confidence
pub const MIN_CENTROID_CONFIDENCE: f64 = 0.3;

/// Highest permitted centroid confidence
pub const MAX_CENTROID_CONFIDENCE: f64 = 0.5;

/// Outcome of resolving one address
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A strategy produced a position
    Resolved(Geocode),
    /// Every strategy declined or failed
    Unresolved,
}

impl Resolution {
    /// Check if resolved
    #[inline]
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Borrow the geocode, if any
    #[inline]
    #[must_use]
    pub fn geocode(&self) -> Option<&Geocode> {
        match self {
            Self::Resolved(g) => Some(g),
            Self::Unresolved => None,
        }
    }

    /// Take the geocode, if any
    #[inline]
    #[must_use]
    pub fn into_geocode(self) -> Option<Geocode> {
        match self {
            Self::Resolved(g) => Some(g),
            Self::Unresolved => None,
        }
    }
}

/// One way of turning an address into a position
#[async_trait]
pub trait ResolutionStrategy: Send + Sync + std::fmt::Debug {
    /// Strategy name (for logging)
    fn name(&self) -> &'static str;

    /// Attempt resolution
    ///
    /// # Returns
    /// - `Ok(Some(geocode))` on success; the resolver stops here
    /// - `Ok(None)` when the strategy does not apply or found nothing
    ///
    /// # Errors
    /// [`ResolutionFailure`]; the resolver logs it and tries the next strategy
    async fn attempt(&self, query: &AddressQuery) -> Result<Option<Geocode>, ResolutionFailure>;
}

/// Full address against a street-level service; exact matches score 1.0
#[derive(Debug, Clone)]
pub struct PrimaryQuery {
    service: Arc<dyn GeocodingService>,
}

impl PrimaryQuery {
    /// Create strategy over `service`
    #[inline]
    #[must_use]
    pub fn new(service: Arc<dyn GeocodingService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ResolutionStrategy for PrimaryQuery {
    fn name(&self) -> &'static str {
        "primary"
    }

    async fn attempt(&self, query: &AddressQuery) -> Result<Option<Geocode>, ResolutionFailure> {
        let found = self.service.lookup(query).await?;
        Ok(found.map(|m| Geocode {
            position: m.position,
            source: GeocodeSource::Primary(self.service.name().to_string()),
            confidence: Confidence::CERTAIN,
        }))
    }
}

/// Simplified address against the same service
///
/// Confidence is the service's own match indicator (1.0 when it supplies
/// none); provenance carries the `_simplified` tag.
#[derive(Debug, Clone)]
pub struct SimplifiedQuery {
    service: Arc<dyn GeocodingService>,
}

impl SimplifiedQuery {
    /// Create strategy over `service`
    #[inline]
    #[must_use]
    pub fn new(service: Arc<dyn GeocodingService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ResolutionStrategy for SimplifiedQuery {
    fn name(&self) -> &'static str {
        "simplified"
    }

    async fn attempt(&self, query: &AddressQuery) -> Result<Option<Geocode>, ResolutionFailure> {
        let Some(simplified) = query.simplified() else {
            return Ok(None);
        };
        tracing::debug!(query = %simplified.single_line(), "simplified query");

        let found = self.service.lookup(&simplified).await?;
        Ok(found.map(|m| {
            let score = m.match_score;
            Geocode {
                position: m.position,
                source: GeocodeSource::Simplified(self.service.name().to_string()),
                confidence: score.map_or(Confidence::CERTAIN, Confidence::clamped),
            }
        }))
    }
}

/// Postal-code centroid with bounded pseudo-random jitter
#[derive(Debug)]
pub struct CentroidFallback {
    table: CentroidTable,
    confidence: Confidence,
    jitter: f64,
    rng: Mutex<StdRng>,
}

impl CentroidFallback {
    /// Create fallback over `table` with confidence 0.3 and full jitter
    #[must_use]
    pub fn new(table: CentroidTable) -> Self {
        Self {
            table,
            confidence: Confidence::clamped(MIN_CENTROID_CONFIDENCE),
            jitter: MAX_JITTER_DEGREES,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// With fixed confidence, clamped into `[0.3, 0.5]`
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        let value = if confidence.is_nan() {
            MIN_CENTROID_CONFIDENCE
        } else {
            confidence.clamp(MIN_CENTROID_CONFIDENCE, MAX_CENTROID_CONFIDENCE)
        };
        self.confidence = Confidence::clamped(value);
        self
    }

    /// With jitter half-width, clamped into `[0, 0.005]`
    #[must_use]
    pub fn with_jitter(mut self, degrees: f64) -> Self {
        self.jitter = if degrees.is_nan() {
            0.0
        } else {
            degrees.clamp(0.0, MAX_JITTER_DEGREES)
        };
        self
    }

    /// With deterministic jitter source
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Configured confidence
    #[inline]
    #[must_use]
    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    /// Configured jitter half-width
    #[inline]
    #[must_use]
    pub fn jitter(&self) -> f64 {
        self.jitter
    }

    /// Underlying table
    #[inline]
    #[must_use]
    pub fn table(&self) -> &CentroidTable {
        &self.table
    }

    fn jittered(&self, centroid: Position) -> Result<Position, ResolutionFailure> {
        let (dx, dy) = {
            let mut rng = self.rng.lock();
            (
                rng.random_range(-self.jitter..=self.jitter),
                rng.random_range(-self.jitter..=self.jitter),
            )
        };
        Position::new(centroid.longitude() + dx, centroid.latitude() + dy)
            .map_err(|e| ResolutionFailure::InvalidCoordinates(e.to_string()))
    }
}

#[async_trait]
impl ResolutionStrategy for CentroidFallback {
    fn name(&self) -> &'static str {
        "centroid"
    }

    async fn attempt(&self, query: &AddressQuery) -> Result<Option<Geocode>, ResolutionFailure> {
        let Some(centroid) = self.table.get(&query.zip) else {
            tracing::debug!(zip = %query.zip, "no centroid for postal code");
            return Ok(None);
        };
        Ok(Some(Geocode {
            position: self.jittered(centroid)?,
            source: GeocodeSource::ZipFallback,
            confidence: self.confidence,
        }))
    }
}
