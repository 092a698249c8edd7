//! End-to-end ingest and geocoding runs against a temporary store

use sl_geocode::{
    CentroidFallback, CentroidTable, GeocodingService, ResolutionFailure, Resolver,
    MAX_JITTER_DEGREES,
};
use sl_pipeline::{BatchScheduler, CancellationToken, Pipeline, PipelineConfig, SourceFormat};
use sl_record::{GeocodeSource, Material, ServiceLineRecord};
use sl_store::{Checkpoint, RecordStore, StoreError};
use sl_test_utils::{records, ScriptedService};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn pipeline(dir: &tempfile::TempDir) -> Pipeline {
    let config = PipelineConfig::new()
        .with_store_path(dir.path().join("data/markers.json"))
        .with_feed_path(Some(dir.path().join("public/data/markers.json")))
        .with_delay_ms(0)
        .with_batch_size(2);
    Pipeline::new(config).unwrap()
}

fn resolver(service: Arc<ScriptedService>) -> Resolver {
    let centroid = CentroidFallback::new(CentroidTable::extended()).with_seed(11);
    Resolver::builder()
        .with_service(service as Arc<dyn GeocodingService>, true)
        .with_strategy(centroid)
        .build()
}

#[tokio::test]
async fn alias_materials_then_zip_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("inventory.csv");
    std::fs::write(
        &source,
        "street address,town,zip,private side,road side\n\
         123 Main St,Example,12309,Cu,PVC\n",
    )
    .unwrap();
    let pipeline = pipeline(&dir);

    let ingest = pipeline.ingest(&source, None).unwrap();
    assert_eq!(ingest.accepted, 1);

    let stored = pipeline.store().load().unwrap();
    assert_eq!(stored[0].private_type, Material::Copper);
    assert_eq!(stored[0].public_type, Material::Plastic);
    assert!(!stored[0].is_resolved());

    let service = Arc::new(
        ScriptedService::new().failing("123 Main St", ResolutionFailure::Status(500)),
    );
    let fallback = resolver(Arc::clone(&service));
    let report = pipeline.geocode_with(fallback).await.unwrap();
    assert_eq!(report.tally.fallback, 1);

    let record = &pipeline.store().load().unwrap()[0];
    let centroid = CentroidTable::extended().get("12309").unwrap();
    assert_eq!(record.geocode_source, Some(GeocodeSource::ZipFallback));
    let drift = record.position.unwrap().max_axis_delta(&centroid);
    assert!(drift <= MAX_JITTER_DEGREES + 1e-9);

    let feed = std::fs::read(dir.path().join("public/data/markers.json")).unwrap();
    assert_eq!(feed, std::fs::read(pipeline.store().path()).unwrap());
}

#[test]
fn record_missing_zip_never_reaches_store() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("inventory.csv");
    std::fs::write(
        &source,
        "street address,town,zip,private side,road side\n\
         1 Elm Ave,Example,,lead,lead\n\
         2 Elm Ave,Example,12304,lead,copper\n",
    )
    .unwrap();
    let pipeline = pipeline(&dir);

    let report = pipeline.ingest(&source, Some(SourceFormat::Csv)).unwrap();
    assert_eq!(report.rejected_by_field.get("zip"), Some(&1));

    let stored = pipeline.store().load().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].address, "2 Elm Ave");
}

#[tokio::test]
async fn geocode_without_store_is_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let err = pipeline(&dir)
        .geocode_with(resolver(Arc::new(ScriptedService::new())))
        .await
        .unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(err.exit_code(), 1);
}

/// Persists to the real store and requests cancellation after `stop_after` checkpoints
struct InterruptingCheckpoint {
    store: RecordStore,
    token: CancellationToken,
    stop_after: usize,
    seen: AtomicUsize,
}

impl Checkpoint for InterruptingCheckpoint {
    fn persist(&self, records: &[ServiceLineRecord]) -> Result<(), StoreError> {
        self.store.persist(records)?;
        if self.seen.fetch_add(1, Ordering::SeqCst) + 1 == self.stop_after {
            self.token.cancel();
        }
        Ok(())
    }
}

#[tokio::test]
async fn interrupted_run_resumes_unresolved_only() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::new(dir.path().join("markers.json"));
    store.persist(&records(6)).unwrap();

    // first run: 3 batches of 2, interrupted after the second checkpoint
    let token = CancellationToken::new();
    let first_service = Arc::new(ScriptedService::new());
    let scheduler = BatchScheduler::new(resolver(Arc::clone(&first_service)))
        .with_batch_size(2)
        .with_delay(Duration::ZERO)
        .with_cancellation(token.clone());
    let checkpoint = InterruptingCheckpoint {
        store: store.clone(),
        token,
        stop_after: 2,
        seen: AtomicUsize::new(0),
    };
    let mut set = store.load().unwrap();
    let report = scheduler.run(&mut set, &checkpoint).await.unwrap();

    assert!(report.cancelled);
    assert_eq!(report.tally.attempted(), 4);
    let after_first = store.load().unwrap();
    assert_eq!(after_first.iter().filter(|r| r.is_resolved()).count(), 4);

    // restart: only the last batch is attempted, earlier results are intact
    let second_service = Arc::new(ScriptedService::new());
    let scheduler = BatchScheduler::new(resolver(Arc::clone(&second_service)))
        .with_batch_size(2)
        .with_delay(Duration::ZERO);
    let mut set = store.load().unwrap();
    let report = scheduler.run(&mut set, &store).await.unwrap();

    assert!(!report.cancelled);
    assert_eq!(report.tally.skipped, 4);
    assert_eq!(report.tally.attempted(), 2);
    // primary and simplified query for each of the two remaining records
    assert_eq!(second_service.calls(), 4);
    assert_eq!(second_service.seen()[0], "5 Main St");

    let final_set = store.load().unwrap();
    assert_eq!(&final_set[..4], &after_first[..4]);
    assert!(final_set.iter().all(ServiceLineRecord::is_resolved));
}

#[tokio::test]
async fn rerun_leaves_resolved_records_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(&dir);
    pipeline.store().persist(&records(3)).unwrap();

    let service = Arc::new(ScriptedService::new().found("2 Main St", -73.84, 42.82));
    let first_run = resolver(Arc::clone(&service));
    pipeline.geocode_with(first_run).await.unwrap();
    let first = pipeline.store().load().unwrap();

    let rerun_service = Arc::new(ScriptedService::new());
    let rerun = resolver(Arc::clone(&rerun_service));
    let report = pipeline.geocode_with(rerun).await.unwrap();

    assert_eq!(report.tally.skipped, 3);
    assert_eq!(rerun_service.calls(), 0);
    assert_eq!(pipeline.store().load().unwrap(), first);
}

#[test]
fn export_geojson_counts_positioned_records() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(&dir);
    let mut set = records(2);
    let done = sl_test_utils::resolved_record("done", "9 Elm St", "12309", -73.8, 42.8);
    set.push(done);
    pipeline.store().persist(&set).unwrap();

    let out = dir.path().join("markers.geojson");
    assert_eq!(pipeline.export_geojson(&out).unwrap(), 1);
    let value: serde_json::Value = serde_json::from_slice(&std::fs::read(out).unwrap()).unwrap();
    assert_eq!(value["features"].as_array().map(Vec::len), Some(1));
}
