//! Service Line Geocoding
//!
//! Multi-strategy address resolution with provenance.
//!
//! # Core Concepts
//!
//! - [`Resolver`]: ordered strategies, first success wins
//! - [`ResolutionStrategy`]: one way of producing a position
//! - [`GeocodingService`]: an external street-level backend
//! - [`Resolution`]: `Resolved(Geocode)` or `Unresolved`, never an error
//!
//! # Strategy Order
//!
//! | # | Strategy | Provenance tag | Confidence |
//! |---|----------|----------------|------------|
//! | 1 | [`PrimaryQuery`] | `<service>` | 1.0 |
//! | 2 | [`SimplifiedQuery`] | `<service>_simplified` | service match indicator |
//! | 3 | [`CentroidFallback`] | `zip_fallback` | fixed, 0.3–0.5 |
//!
//! # Example
//!
//! ```rust,ignore
//! use sl_geocode::{Resolver, ResolverConfig};
//!
//! let resolver = Resolver::from_config(&ResolverConfig::default())?;
//! match resolver.resolve("671 Acorn Dr", "Niskayuna", "12309").await {
//!     Resolution::Resolved(geocode) => record.apply_geocode(geocode),
//!     Resolution::Unresolved => {}
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod centroid;
pub mod config;
pub mod error;
pub mod query;
pub mod resolver;
pub mod service;
pub mod strategy;
pub mod throttle;

pub use centroid::CentroidTable;
pub use config::{CentroidTableSpec, NamedCentroidTable, ResolverConfig, ServiceKind};
pub use error::{ResolutionFailure, SetupError};
pub use query::AddressQuery;
pub use resolver::{Resolver, ResolverBuilder};
pub use service::{ArcGisService, GeocodingService, NominatimService, ServiceMatch};
pub use strategy::{
    CentroidFallback, PrimaryQuery, Resolution, ResolutionStrategy, SimplifiedQuery,
    MAX_JITTER_DEGREES,
};
pub use throttle::RequestThrottle;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for resolving addresses
    pub use crate::{
        AddressQuery, GeocodingService, Resolution, ResolutionFailure, ResolutionStrategy,
        Resolver, ResolverConfig,
    };
}
