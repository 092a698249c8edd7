//! Testing utilities for the service line workspace
//!
//! Shared record fixtures and a scripted geocoding service.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use sl_geocode::{AddressQuery, GeocodingService, ResolutionFailure, ServiceMatch};
use sl_record::{
    Confidence, Geocode, GeocodeSource, Material, Position, RecordId, ServiceLineRecord, ZipCode,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn fixture_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, 29).unwrap()
}

pub fn record(id: &str, address: &str, zip: &str) -> ServiceLineRecord {
    ServiceLineRecord {
        id: RecordId::new(id).unwrap(),
        address: address.to_string(),
        town: Some("Niskayuna".to_string()),
        zip: ZipCode::parse(zip).unwrap(),
        private_type: Material::Copper,
        public_type: Material::Unknown,
        verified: false,
        confidence: Confidence::new(0.8).unwrap(),
        last_verified: fixture_date(),
        position: None,
        geocode_source: None,
        geocode_confidence: None,
    }
}

pub fn resolved_record(
    id: &str,
    address: &str,
    zip: &str,
    lng: f64,
    lat: f64,
) -> ServiceLineRecord {
    let mut r = record(id, address, zip);
    r.apply_geocode(Geocode {
        position: Position::new(lng, lat).unwrap(),
        source: GeocodeSource::Primary("nominatim".into()),
        confidence: Confidence::CERTAIN,
    });
    r
}

/// `count` unresolved records with ids `r000`, `r001`, …
pub fn records(count: usize) -> Vec<ServiceLineRecord> {
    (0..count)
        .map(|i| {
            let address = format!("{} Main St", i + 1);
            record(&format!("r{i:03}"), &address, "12309")
        })
        .collect()
}

/// Scripted answer for one address
#[derive(Debug, Clone)]
pub enum Scripted {
    Found(ServiceMatch),
    NotFound,
    Fail(ResolutionFailure),
}

/// Geocoding service answering from a script keyed by query address
///
/// Addresses with no script entry answer `NotFound`. Every call is counted.
#[derive(Debug, Default)]
pub struct ScriptedService {
    script: HashMap<String, Scripted>,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn found(mut self, address: &str, lng: f64, lat: f64) -> Self {
        let position = Position::new(lng, lat).unwrap();
        let answer = Scripted::Found(ServiceMatch::new(position));
        self.script.insert(address.to_string(), answer);
        self
    }

    pub fn failing(mut self, address: &str, failure: ResolutionFailure) -> Self {
        let answer = Scripted::Fail(failure);
        self.script.insert(address.to_string(), answer);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl GeocodingService for ScriptedService {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn lookup(
        &self,
        query: &AddressQuery,
    ) -> Result<Option<ServiceMatch>, ResolutionFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(query.address.clone());
        let answer = self.script.get(&query.address).cloned();
        match answer.unwrap_or(Scripted::NotFound) {
            Scripted::Found(m) => Ok(Some(m)),
            Scripted::NotFound => Ok(None),
            Scripted::Fail(f) => Err(f),
        }
    }
}
