//! ArcGIS `findAddressCandidates` geocoder (NYS GIS street and address composite)

use super::{trim_base_url, GeocodingService, ServiceMatch};
use crate::error::ResolutionFailure;
use crate::query::AddressQuery;
use crate::throttle::RequestThrottle;
use async_trait::async_trait;
use serde::Deserialize;
use sl_record::Position;

/// NYS GIS composite locator
pub const DEFAULT_ARCGIS_URL: &str =
    "https://gisservices.its.ny.gov/arcgis/rest/services/Locators/Street_and_Address_Composite/GeocodeServer";

#[derive(Debug, Deserialize)]
struct CandidateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<ServiceFault>,
}

/// Error object ArcGIS returns inside an HTTP 200 body
#[derive(Debug, Deserialize)]
struct ServiceFault {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    location: Location,
    #[serde(default)]
    score: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Location {
    x: f64,
    y: f64,
}

/// ArcGIS geocode server client
#[derive(Debug)]
pub struct ArcGisService {
    client: reqwest::Client,
    base_url: String,
    throttle: RequestThrottle,
}

impl ArcGisService {
    /// Create client against a `GeocodeServer` root
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str, throttle: RequestThrottle) -> Self {
        Self {
            client,
            base_url: trim_base_url(base_url),
            throttle,
        }
    }
}

#[async_trait]
impl GeocodingService for ArcGisService {
    fn name(&self) -> &str {
        "nys_gis"
    }

    async fn lookup(
        &self,
        query: &AddressQuery,
    ) -> Result<Option<ServiceMatch>, ResolutionFailure> {
        self.throttle.wait().await;

        let text = query.single_line();
        let response = self
            .client
            .get(format!("{}/findAddressCandidates", self.base_url))
            .query(&[
                ("SingleLine", text.as_str()),
                ("outFields", "*"),
                ("maxLocations", "1"),
                ("outSR", "4326"),
                ("f", "json"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolutionFailure::Status(status.as_u16()));
        }

        let body: CandidateResponse = response
            .json()
            .await
            .map_err(|e| ResolutionFailure::Decode(e.to_string()))?;
        if let Some(fault) = body.error {
            tracing::debug!(
                code = ?fault.code,
                message = %fault.message,
                "locator reported an error"
            );
            return Err(match fault.code {
                Some(code) => ResolutionFailure::Status(code),
                None => ResolutionFailure::Decode(fault.message),
            });
        }
        let Some(best) = body.candidates.into_iter().next() else {
            return Ok(None);
        };

        let position = Position::new(best.location.x, best.location.y)
            .map_err(|e| ResolutionFailure::InvalidCoordinates(e.to_string()))?;

        // ArcGIS scores are 0..=100
        let mut found = ServiceMatch::new(position);
        if let Some(score) = best.score {
            found = found.with_score((score / 100.0).clamp(0.0, 1.0));
        }
        Ok(Some(found))
    }
}
