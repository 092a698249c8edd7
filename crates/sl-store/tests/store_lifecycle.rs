//! Merge and persistence across repeated ingest runs

use sl_record::Material;
use sl_store::{Checkpoint, RecordStore};
use sl_test_utils::{record, records, resolved_record};

#[test]
fn repeated_merge_is_stable_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::new(dir.path().join("markers.json"))
        .with_feed(dir.path().join("public/markers.json"));

    store.merge(records(4)).unwrap();
    let first = std::fs::read(store.path()).unwrap();
    let outcome = store.merge(records(4)).unwrap();
    let second = std::fs::read(store.path()).unwrap();

    assert_eq!(first, second);
    assert_eq!(outcome.appended, 0);
    assert_eq!(outcome.updated, 4);
}

#[test]
fn resolved_positions_survive_reingest() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::new(dir.path().join("markers.json"));

    let mut set = records(2);
    set[0] = resolved_record("r000", "1 Main St", "12309", -73.83, 42.81);
    store.persist(&set).unwrap();

    let mut reingested = records(2);
    reingested[0].private_type = Material::Lead;
    reingested.push(record("r002", "3 Main St", "12309"));
    let outcome = store.merge(reingested).unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded.len(), 3);
    assert_eq!(loaded[0], set[0]);
    assert_eq!(outcome.preserved, 1);
    assert_eq!(outcome.appended, 1);
}
