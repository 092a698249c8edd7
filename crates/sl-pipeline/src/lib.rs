//! Service Line Pipeline
//!
//! Orchestrates the record ingestion and geocoding resolution pipeline.
//!
//! # Architecture
//!
//! ```text
//! source ──► Extractor ──► Normalizer ──► Validator ──► Store Merger ──► store
//!                                                                          │
//! store ──► BatchScheduler ──► Resolver (per record) ──► checkpoint ◄──────┘
//!                                                          (every batch)
//! ```
//!
//! # Error Propagation
//!
//! | Condition | Handling |
//! |-----------|----------|
//! | `MissingInput` | fatal, before any processing |
//! | `SchemaViolation` | record skipped and logged |
//! | `ResolutionFailure` | next strategy; record keeps prior state |
//! | `PersistenceFailure` | fatal; previous store left intact |
//!
//! # Example
//!
//! ```rust,ignore
//! use sl_pipeline::{Pipeline, PipelineConfig};
//!
//! let pipeline = Pipeline::new(PipelineConfig::load(None)?)?;
//! pipeline.ingest(Path::new("inventory.csv"), None)?;
//! let report = pipeline.geocode().await?;
//! println!("{report}");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod cancel;
pub mod config;
pub mod error;
pub mod ingest;
pub mod pipeline;
pub mod scheduler;

pub use cancel::CancellationToken;
pub use config::{ExtractSettings, PipelineConfig, ENV_BATCH_SIZE, ENV_DELAY_MS};
pub use error::PipelineError;
pub use ingest::{ingest_source, IngestReport, SourceFormat};
pub use pipeline::Pipeline;
pub use scheduler::{BatchScheduler, RunReport, RunTally};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving the pipeline
    pub use crate::{
        BatchScheduler, CancellationToken, IngestReport, Pipeline, PipelineConfig, PipelineError,
        RunReport, SourceFormat,
    };
}
