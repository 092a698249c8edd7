//! External geocoding services
//!
//! Every service answers one question: "where is this query?", returning at
//! most one candidate. Services are shared between the primary and
//! simplified strategies, so a service's [`RequestThrottle`] spaces every
//! request it sends regardless of which strategy issued it.
//!
//! [`RequestThrottle`]: crate::throttle::RequestThrottle

mod arcgis;
mod nominatim;

pub use arcgis::{ArcGisService, DEFAULT_ARCGIS_URL};
pub use nominatim::{NominatimService, DEFAULT_NOMINATIM_URL};

use crate::error::ResolutionFailure;
use crate::query::AddressQuery;
use async_trait::async_trait;
use sl_record::Position;

/// First candidate returned by a geocoding service
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceMatch {
    /// Candidate location
    pub position: Position,
    /// Provider match indicator normalized into `[0, 1]`, when supplied
    pub match_score: Option<f64>,
}

impl ServiceMatch {
    /// Create match without a score
    #[inline]
    #[must_use]
    pub fn new(position: Position) -> Self {
        Self {
            position,
            match_score: None,
        }
    }

    /// With provider score
    #[inline]
    #[must_use]
    pub fn with_score(mut self, score: f64) -> Self {
        self.match_score = Some(score);
        self
    }
}

/// Street-level geocoding backend
#[async_trait]
pub trait GeocodingService: Send + Sync + std::fmt::Debug {
    /// Provenance name written to resolved records
    fn name(&self) -> &str;

    /// Look up one query
    ///
    /// # Returns
    /// - `Ok(Some(_))` for the first candidate
    /// - `Ok(None)` when the service found nothing
    ///
    /// # Errors
    /// [`ResolutionFailure`] for transport, status or decode problems
    async fn lookup(&self, query: &AddressQuery) -> Result<Option<ServiceMatch>, ResolutionFailure>;
}

pub(crate) fn trim_base_url(base: &str) -> String {
    base.trim_end_matches('/').to_string()
}
