//! OpenStreetMap Nominatim free-text search

use super::{trim_base_url, GeocodingService, ServiceMatch};
use crate::error::ResolutionFailure;
use crate::query::AddressQuery;
use crate::throttle::RequestThrottle;
use async_trait::async_trait;
use serde::Deserialize;
use sl_record::Position;

/// Public Nominatim endpoint
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
    #[serde(default)]
    importance: Option<f64>,
}

/// Nominatim `/search` client
#[derive(Debug)]
pub struct NominatimService {
    client: reqwest::Client,
    base_url: String,
    country_codes: String,
    throttle: RequestThrottle,
}

impl NominatimService {
    /// Create client against `base_url`
    ///
    /// `client` must already carry the identifying `User-Agent` the public
    /// instance requires.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str, throttle: RequestThrottle) -> Self {
        Self {
            client,
            base_url: trim_base_url(base_url),
            country_codes: "us".to_string(),
            throttle,
        }
    }

    /// With country filter (comma-separated ISO codes)
    #[must_use]
    pub fn with_country_codes(mut self, codes: impl Into<String>) -> Self {
        self.country_codes = codes.into();
        self
    }
}

#[async_trait]
impl GeocodingService for NominatimService {
    fn name(&self) -> &str {
        "nominatim"
    }

    async fn lookup(
        &self,
        query: &AddressQuery,
    ) -> Result<Option<ServiceMatch>, ResolutionFailure> {
        self.throttle.wait().await;

        let text = query.single_line();
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("q", text.as_str()),
                ("format", "json"),
                ("limit", "1"),
                ("countrycodes", self.country_codes.as_str()),
                ("addressdetails", "1"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolutionFailure::Status(status.as_u16()));
        }

        let places: Vec<Place> = response
            .json()
            .await
            .map_err(|e| ResolutionFailure::Decode(e.to_string()))?;
        let Some(place) = places.into_iter().next() else {
            return Ok(None);
        };

        let bad = |axis: &str, raw: &str| ResolutionFailure::Decode(format!("{axis} '{raw}'"));
        let lat: f64 = place.lat.parse().map_err(|_| bad("lat", &place.lat))?;
        let lon: f64 = place.lon.parse().map_err(|_| bad("lon", &place.lon))?;
        let position = Position::new(lon, lat)
            .map_err(|e| ResolutionFailure::InvalidCoordinates(e.to_string()))?;

        let mut found = ServiceMatch::new(position);
        if let Some(importance) = place.importance {
            found = found.with_score(importance.clamp(0.0, 1.0));
        }
        Ok(Some(found))
    }
}
