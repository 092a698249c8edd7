//! Canonical store file and its derived feed

use crate::error::StoreError;
use crate::merge::{merge_records, MergeOutcome};
use sl_record::ServiceLineRecord;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Idempotent checkpoint: replace the persisted store with `records`
pub trait Checkpoint {
    /// Persist the full in-memory record set
    ///
    /// # Errors
    /// [`StoreError`] if the store cannot be replaced; the previous file
    /// is left intact.
    fn persist(&self, records: &[ServiceLineRecord]) -> Result<(), StoreError>;
}

/// The canonical record store: a JSON array on disk
///
/// Sole writer of the store file. Every successful write also refreshes the
/// derived presentation feed, when one is configured.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
    feed_path: Option<PathBuf>,
}

impl RecordStore {
    /// Open store at `path` (the file need not exist yet)
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            feed_path: None,
        }
    }

    /// With derived feed copy
    #[inline]
    #[must_use]
    pub fn with_feed(mut self, path: impl Into<PathBuf>) -> Self {
        self.feed_path = Some(path.into());
        self
    }

    /// Store path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Derived feed path
    #[inline]
    #[must_use]
    pub fn feed_path(&self) -> Option<&Path> {
        self.feed_path.as_deref()
    }

    /// Load every record
    ///
    /// # Errors
    /// [`StoreError::Missing`] if the file is absent; read and decode errors otherwise
    pub fn load(&self) -> Result<Vec<ServiceLineRecord>, StoreError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::Missing(self.path.clone()));
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let records: Vec<ServiceLineRecord> =
            serde_json::from_slice(&bytes).map_err(|source| StoreError::Decode {
                path: self.path.clone(),
                source,
            })?;
        tracing::debug!(path = %self.path.display(), records = records.len(), "store loaded");
        Ok(records)
    }

    /// Load every record, treating an absent file as an empty store
    ///
    /// # Errors
    /// Read and decode errors
    pub fn load_or_empty(&self) -> Result<Vec<ServiceLineRecord>, StoreError> {
        match self.load() {
            Err(StoreError::Missing(_)) => Ok(Vec::new()),
            other => other,
        }
    }

    /// Merge `incoming` into the persisted store and write it back
    ///
    /// # Errors
    /// Load errors other than a missing file, and any write failure
    pub fn merge<I>(&self, incoming: I) -> Result<MergeOutcome, StoreError>
    where
        I: IntoIterator<Item = ServiceLineRecord>,
    {
        let existing = self.load_or_empty()?;
        let (merged, outcome) = merge_records(existing, incoming);
        self.write(&merged)?;
        tracing::info!(
            path = %self.path.display(),
            total = merged.len(),
            appended = outcome.appended,
            updated = outcome.updated,
            preserved = outcome.preserved,
            "store merged"
        );
        Ok(outcome)
    }

    /// Atomically replace the store, then refresh the feed
    ///
    /// # Errors
    /// Encode, write or rename failure
    pub fn write(&self, records: &[ServiceLineRecord]) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(records).map_err(StoreError::Encode)?;
        write_atomic(&self.path, &bytes)?;
        if let Some(feed) = &self.feed_path {
            write_atomic(feed, &bytes)?;
            tracing::debug!(feed = %feed.display(), "feed refreshed");
        }
        Ok(())
    }
}

impl Checkpoint for RecordStore {
    fn persist(&self, records: &[ServiceLineRecord]) -> Result<(), StoreError> {
        self.write(records)
    }
}

/// Write `bytes` to a sibling temporary file, then rename it over `path`
///
/// Readers see either the old file or the new one, never a partial write.
///
/// # Errors
/// [`StoreError::Write`] or [`StoreError::Persist`]
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| StoreError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sl_test_utils::{record, records, resolved_record};

    #[test]
    fn missing_store_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("markers.json"));
        assert!(store.load().unwrap_err().is_missing());
        assert!(store.load_or_empty().unwrap().is_empty());
    }

    #[test]
    fn write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("data/markers.json"));
        let mut set = records(3);
        set.push(resolved_record("done", "9 Elm St", "12304", -73.88, 42.78));

        store.write(&set).unwrap();
        assert_eq!(store.load().unwrap(), set);
    }

    #[test]
    fn feed_mirrors_store() {
        let dir = tempfile::tempdir().unwrap();
        let feed = dir.path().join("public/markers.json");
        let store = RecordStore::new(dir.path().join("markers.json")).with_feed(&feed);

        store.persist(&records(2)).unwrap();
        let store_bytes = std::fs::read(store.path()).unwrap();
        assert_eq!(std::fs::read(&feed).unwrap(), store_bytes);
    }

    #[test]
    fn corrupt_store_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("markers.json");
        std::fs::write(&path, "[{\"id\": ").unwrap();
        let err = RecordStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
    }

    #[test]
    fn records_without_town_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("markers.json");
        std::fs::write(
            &path,
            r#"[{"id":"parcel_1","address":"671 ACORN DRIVE","zip":"12309",
                "private_type":"copper","public_type":"unknown","verified":false,
                "confidence":0.8,"last_verified":"2025-04-29"}]"#,
        )
        .unwrap();

        let loaded = RecordStore::new(&path).load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].town, None);
        assert!(!loaded[0].is_resolved());
    }

    #[test]
    fn merge_persists_combined_set() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("markers.json"));
        store.write(&[record("a", "1 A St", "12309")]).unwrap();

        let incoming = vec![
            record("a", "1 A St", "12309"),
            record("b", "2 B St", "12309"),
        ];
        let outcome = store.merge(incoming).unwrap();
        assert_eq!(outcome.appended, 1);
        assert_eq!(outcome.updated, 1);
        assert_eq!(store.load().unwrap().len(), 2);
    }

    #[test]
    fn failed_feed_write_cleans_up_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("markers.json");
        let store = RecordStore::new(&path);
        store.write(&records(1)).unwrap();

        // a directory where the feed should go makes the rename fail
        let feed_dir = dir.path().join("feed");
        std::fs::create_dir_all(feed_dir.join("occupied")).unwrap();
        let blocked = RecordStore::new(&path).with_feed(&feed_dir);
        let err = blocked.write(&records(2)).unwrap_err();
        assert!(err.is_persistence_failure());

        let tmp_leftovers = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(".tmp"))
            .count();
        assert_eq!(tmp_leftovers, 0);
    }
}
