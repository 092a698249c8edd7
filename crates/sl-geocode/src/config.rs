//! Resolver configuration

use crate::centroid::CentroidTable;
use crate::error::SetupError;
use crate::service::{
    ArcGisService, GeocodingService, NominatimService, DEFAULT_ARCGIS_URL, DEFAULT_NOMINATIM_URL,
};
use crate::strategy::{MAX_JITTER_DEGREES, MIN_CENTROID_CONFIDENCE};
use crate::throttle::RequestThrottle;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Street-level geocoding backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    /// OpenStreetMap Nominatim free-text search
    #[default]
    Nominatim,
    /// NYS GIS ArcGIS address locator
    NysGis,
}

impl ServiceKind {
    /// Endpoint used when none is configured
    #[must_use]
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Nominatim => DEFAULT_NOMINATIM_URL,
            Self::NysGis => DEFAULT_ARCGIS_URL,
        }
    }
}

/// Built-in centroid tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamedCentroidTable {
    /// Four-zip table
    Extended,
    /// Two-zip table
    Compact,
}

/// Centroid table selection: a built-in name or an inline `zip → [lng, lat]` map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CentroidTableSpec {
    /// Built-in table
    Named(NamedCentroidTable),
    /// Deployment-specific table
    Custom(BTreeMap<String, [f64; 2]>),
}

impl Default for CentroidTableSpec {
    fn default() -> Self {
        Self::Named(NamedCentroidTable::Extended)
    }
}

impl CentroidTableSpec {
    /// Materialize the table
    ///
    /// # Errors
    /// [`SetupError::Centroid`] for an invalid custom entry
    pub fn build(&self) -> Result<CentroidTable, SetupError> {
        match self {
            Self::Named(NamedCentroidTable::Extended) => Ok(CentroidTable::extended()),
            Self::Named(NamedCentroidTable::Compact) => Ok(CentroidTable::compact()),
            Self::Custom(map) => {
                CentroidTable::from_pairs(map.iter().map(|(k, v)| (k.clone(), *v)))
            }
        }
    }
}

/// Everything needed to assemble a [`Resolver`](crate::Resolver)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Backend for the primary and simplified strategies
    pub service: ServiceKind,
    /// Endpoint override
    pub base_url: Option<String>,
    /// `User-Agent` sent with every request
    pub user_agent: String,
    /// State code appended to free-text queries
    pub region: String,
    /// Country filter for services that support one
    pub country_codes: String,
    /// Per-request timeout
    pub request_timeout_ms: u64,
    /// Minimum spacing between requests to the service
    pub min_request_interval_ms: u64,
    /// Enable the simplified-query strategy
    pub simplify: bool,
    /// Centroid fallback table
    pub centroid_table: CentroidTableSpec,
    /// Centroid fallback confidence, clamped into `[0.3, 0.5]`
    pub centroid_confidence: f64,
    /// Centroid jitter half-width in degrees, clamped into `[0, 0.005]`
    pub jitter_degrees: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            service: ServiceKind::default(),
            base_url: None,
            user_agent: format!("service-line-atlas/{}", crate::VERSION),
            region: "NY".to_string(),
            country_codes: "us".to_string(),
            request_timeout_ms: 10_000,
            min_request_interval_ms: 1_000,
            simplify: true,
            centroid_table: CentroidTableSpec::default(),
            centroid_confidence: MIN_CENTROID_CONFIDENCE,
            jitter_degrees: MAX_JITTER_DEGREES,
        }
    }
}

impl ResolverConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With backend
    #[inline]
    #[must_use]
    pub fn with_service(mut self, service: ServiceKind) -> Self {
        self.service = service;
        self
    }

    /// With endpoint override
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// With minimum request spacing
    #[inline]
    #[must_use]
    pub fn with_min_request_interval_ms(mut self, ms: u64) -> Self {
        self.min_request_interval_ms = ms;
        self
    }

    /// With centroid table
    #[inline]
    #[must_use]
    pub fn with_centroid_table(mut self, table: CentroidTableSpec) -> Self {
        self.centroid_table = table;
        self
    }

    /// With centroid confidence
    #[inline]
    #[must_use]
    pub fn with_centroid_confidence(mut self, confidence: f64) -> Self {
        self.centroid_confidence = confidence;
        self
    }

    /// Effective endpoint
    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.service.default_base_url())
    }

    /// Build the configured geocoding service
    ///
    /// # Errors
    /// [`SetupError`] if the endpoint is not http(s) or the client cannot be built
    pub fn build_service(&self) -> Result<Arc<dyn GeocodingService>, SetupError> {
        let endpoint = self.endpoint();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(SetupError::Endpoint(endpoint.to_string()));
        }

        let client = reqwest::Client::builder()
            .user_agent(self.user_agent.clone())
            .timeout(Duration::from_millis(self.request_timeout_ms))
            .build()?;
        let throttle = RequestThrottle::new(Duration::from_millis(self.min_request_interval_ms));

        let service: Arc<dyn GeocodingService> = match self.service {
            ServiceKind::Nominatim => Arc::new(
                NominatimService::new(client, endpoint, throttle)
                    .with_country_codes(self.country_codes.clone()),
            ),
            ServiceKind::NysGis => Arc::new(ArcGisService::new(client, endpoint, throttle)),
        };
        Ok(service)
    }
}
