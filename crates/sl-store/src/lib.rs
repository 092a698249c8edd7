//! Service Line Store
//!
//! The canonical persisted record set.
//!
//! # Guarantees
//!
//! - **Atomic**: every write goes to a temporary sibling file that is
//!   renamed over the target, so an interrupted write leaves the previous
//!   store intact
//! - **Idempotent**: [`merge_records`] applied twice equals applied once
//! - **Non-destructive**: records carrying a `geocode_source` are never
//!   overwritten by a merge
//!
//! The derived feed consumed by the presentation layer is refreshed from
//! the same bytes after every successful write.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod geojson;
pub mod merge;
pub mod store;

pub use error::StoreError;
pub use geojson::{export_geojson, to_feature_collection};
pub use merge::{merge_records, MergeOutcome};
pub use store::{write_atomic, Checkpoint, RecordStore};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
