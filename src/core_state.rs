//! Application state shared by every HTTP handler.
//!
//! Built once at startup and frozen: the lab catalogue, the extractor and
//! the upload policy never change while the server runs, so handlers read
//! them through `Arc<CoreState>` without locking.

use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::clock::{Clock, SystemClock};
use crate::config::{ServerConfig, UploadConfig};
use crate::pipeline::extraction::{DocumentExtractor, ExtractionError, TextExtractor};
use crate::pipeline::labs::{CatalogueError, LabCatalogue, LabRecognizer};

pub struct CoreState {
    catalogue: LabCatalogue,
    extractor: Arc<dyn TextExtractor>,
    clock: Arc<dyn Clock>,
    extraction_slots: Arc<Semaphore>,
    /// Upload limits and extraction policy.
    pub upload: UploadConfig,
}

impl CoreState {
    pub fn new(
        catalogue: LabCatalogue,
        extractor: Arc<dyn TextExtractor>,
        clock: Arc<dyn Clock>,
        upload: UploadConfig,
    ) -> Self {
        Self {
            catalogue,
            extractor,
            clock,
            extraction_slots: Arc::new(Semaphore::new(upload.max_concurrent_extractions)),
            upload,
        }
    }

    /// Production wiring from server configuration.
    ///
    /// Fails on an invalid configuration or a defective lab catalogue, so
    /// these are caught before the listener is bound.
    pub fn from_config(config: &ServerConfig) -> Result<Self, CoreError> {
        config.validate().map_err(CoreError::InvalidConfig)?;

        let catalogue = LabCatalogue::standard()?;
        let extractor = DocumentExtractor::with_defaults(config.tessdata_dir.as_deref())?;

        tracing::info!(
            lab_tests = catalogue.len(),
            max_upload_bytes = config.max_upload_bytes,
            extraction_timeout_secs = config.extraction_timeout,
            max_concurrent_extractions = config.max_concurrent_extractions,
            "Core state initialized"
        );

        Ok(Self::new(
            catalogue,
            Arc::new(extractor),
            Arc::new(SystemClock),
            config.upload_config(),
        ))
    }

    pub fn catalogue(&self) -> &LabCatalogue {
        &self.catalogue
    }

    /// Shared handle for moving into a blocking task.
    pub fn extractor(&self) -> Arc<dyn TextExtractor> {
        Arc::clone(&self.extractor)
    }

    /// Permits bounding concurrent extractions across all requests.
    pub fn extraction_slots(&self) -> Arc<Semaphore> {
        Arc::clone(&self.extraction_slots)
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Recognizer over the frozen catalogue, using the configured parse-failure policy.
    pub fn recognizer(&self) -> LabRecognizer<'_> {
        LabRecognizer::new(&self.catalogue, self.clock.as_ref())
            .with_policy(self.upload.parse_failure_policy)
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Lab catalogue error: {0}")]
    Catalogue(#[from] CatalogueError),
    #[error("Extractor setup failed: {0}")]
    Extraction(#[from] ExtractionError),
}
