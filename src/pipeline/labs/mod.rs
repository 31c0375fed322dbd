//! Lab value recognition over extracted document text.
//!
//! `catalogue` holds the frozen table of recognised tests (name pattern,
//! accepted unit spellings, reference range, category). `recognizer` scans
//! free text against it and classifies every value it finds.

pub mod catalogue;
pub mod recognizer;

pub use catalogue::*;
pub use recognizer::*;

use thiserror::Error;

/// Configuration defects detected while building a `LabCatalogue`.
#[derive(Error, Debug)]
pub enum CatalogueError {
    #[error("Lab test '{0}' has a pattern but no reference range")]
    MissingReferenceRange(String),

    #[error("Reference range '{0}' has no matching lab test pattern")]
    OrphanReferenceRange(String),

    #[error("Lab test key '{0}' is defined more than once")]
    DuplicateKey(String),

    #[error("Lab test '{0}' accepts no unit spellings")]
    NoUnits(String),

    #[error("Reference range for '{key}' is inverted ({min} > {max})")]
    InvertedRange { key: String, min: f64, max: f64 },

    #[error("Invalid pattern for lab test '{key}': {source}")]
    InvalidPattern {
        key: String,
        #[source]
        source: regex::Error,
    },
}
