//! Service Line Record Model
//!
//! The canonical entity persisted by the pipeline and consumed read-only by the
//! presentation layer.
//!
//! # Core Concepts
//!
//! - [`ServiceLineRecord`]: one property's service line, both sides
//! - [`Material`]: fixed pipe-material vocabulary
//! - [`ZipCode`], [`Confidence`], [`Position`]: invariant-carrying newtypes
//! - [`GeocodeSource`] / [`Geocode`]: resolution provenance attached to a record
//!
//! Every newtype validates on construction *and* on deserialization, so a
//! record decoded from the store can never violate the schema.
//!
//! # Example
//!
//! ```rust,ignore
//! use sl_record::{Confidence, Geocode, GeocodeSource, Position};
//!
//! record.apply_geocode(Geocode {
//!     position: Position::new(-73.8292, 42.8136)?,
//!     source: GeocodeSource::ZipFallback,
//!     confidence: Confidence::clamped(0.3),
//! });
//! assert!(record.is_resolved());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod geocode;
mod material;
mod record;

pub use error::RecordError;
pub use geocode::{Geocode, GeocodeSource, Position, ZIP_FALLBACK_TAG};
pub use material::Material;
pub use record::{Confidence, RecordId, ServiceLineRecord, ZipCode};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
