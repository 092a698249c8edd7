//! GeoJSON export of resolved records

use crate::error::StoreError;
use crate::store::write_atomic;
use serde_json::{json, Value};
use sl_record::ServiceLineRecord;
use std::path::Path;

/// Build a `FeatureCollection` of point features
///
/// Records without a position are omitted.
#[must_use]
pub fn to_feature_collection(records: &[ServiceLineRecord]) -> Value {
    let features: Vec<Value> = records
        .iter()
        .filter_map(|r| {
            let position = r.position?;
            Some(json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [position.longitude(), position.latitude()],
                },
                "properties": {
                    "id": r.id.as_str(),
                    "address": r.address,
                    "town": r.town,
                    "zip": r.zip.as_str(),
                    "private_type": r.private_type.as_str(),
                    "public_type": r.public_type.as_str(),
                    "verified": r.verified,
                    "confidence": r.confidence.value(),
                    "last_verified": r.last_verified.format("%Y-%m-%d").to_string(),
                    "geocode_source": r.geocode_source.as_ref().map(ToString::to_string),
                    "geocode_confidence": r.geocode_confidence.map(|c| c.value()),
                },
            }))
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

/// Write the feature collection atomically to `path`, returning the feature count
///
/// # Errors
/// Encode or write failure
pub fn export_geojson(path: &Path, records: &[ServiceLineRecord]) -> Result<usize, StoreError> {
    let collection = to_feature_collection(records);
    let count = collection["features"].as_array().map_or(0, Vec::len);
    let bytes = serde_json::to_vec(&collection).map_err(StoreError::Encode)?;
    write_atomic(path, &bytes)?;
    tracing::info!(path = %path.display(), features = count, "geojson exported");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sl_test_utils::{record, resolved_record};

    #[test]
    fn only_positioned_records_become_features() {
        let records = vec![
            record("a", "1 A St", "12309"),
            resolved_record("b", "2 B St", "12309", -73.81, 42.81),
        ];
        let fc = to_feature_collection(&records);
        let features = fc["features"].as_array().unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0]["geometry"]["coordinates"], json!([-73.81, 42.81]));
        assert_eq!(features[0]["properties"]["geocode_source"], "nominatim");
        assert_eq!(features[0]["properties"]["private_type"], "copper");
    }

    #[test]
    fn export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("markers.geojson");
        let record = resolved_record("b", "2 B St", "12309", -73.81, 42.81);
        let n = export_geojson(&path, &[record]).unwrap();
        assert_eq!(n, 1);
        let back: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(back["type"], "FeatureCollection");
    }
}
