//! Service Line Ingest
//!
//! The boundary between raw source material and the record model.
//!
//! # Core Operations
//!
//! - **Extract**: pull [`CandidateRecord`]s out of decoded document text
//!   ([`TextExtractor`]) or tabular exports ([`TabularExtractor`])
//! - **Normalize**: canonicalize free text and map material aliases onto the
//!   fixed vocabulary ([`Normalizer`])
//! - **Validate**: enforce the record schema, producing a typed
//!   [`ServiceLineRecord`](sl_record::ServiceLineRecord) or a
//!   [`SchemaViolation`] naming the first offending field ([`Validator`])
//!
//! # Architecture
//!
//! ```text
//! text / CSV → Extractor → CandidateRecord → Normalizer → Validator → ServiceLineRecord
//!                   ↓                                         ↓
//!            unmatched lines dropped               violations logged and skipped
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod candidate;
pub mod error;
pub mod extractor;
pub mod normalizer;
pub mod validator;

pub use candidate::{CandidateRecord, MatchKind};
pub use error::{Field, IngestError, SchemaViolation, ViolationReason};
pub use extractor::{
    Extractor, ExtractorConfig, TabularExtractor, TextExtractor, FALLBACK_CONFIDENCE,
    PRIMARY_CONFIDENCE,
};
pub use normalizer::{canonical_text, normalize_material, stable_id, Normalizer};
pub use validator::{ValidationReport, Validator};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running the ingest stages
    pub use crate::{
        CandidateRecord, Extractor, ExtractorConfig, Normalizer, SchemaViolation,
        TabularExtractor, TextExtractor, Validator,
    };
}
