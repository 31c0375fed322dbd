use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;

use super::pdf::PdfTextExtractor;
use super::types::{
    DocumentKind, ExtractionMethod, ExtractionResult, OcrEngine, PdfExtractor, TextExtractor,
};
use super::ExtractionError;

/// Concrete implementation of the text extractor.
/// Uses trait objects for OCR and PDF extraction, enabling dependency injection.
pub struct DocumentExtractor {
    ocr_engine: Box<dyn OcrEngine + Send + Sync>,
    pdf_extractor: Box<dyn PdfExtractor + Send + Sync>,
}

impl DocumentExtractor {
    pub fn new(
        ocr_engine: Box<dyn OcrEngine + Send + Sync>,
        pdf_extractor: Box<dyn PdfExtractor + Send + Sync>,
    ) -> Self {
        Self {
            ocr_engine,
            pdf_extractor,
        }
    }

    /// Production wiring: pdf-extract for PDFs, Tesseract for images when the
    /// `ocr` feature is compiled in.
    pub fn with_defaults(tessdata_dir: Option<&Path>) -> Result<Self, ExtractionError> {
        Ok(Self::new(default_ocr_engine(tessdata_dir)?, Box::new(PdfTextExtractor)))
    }
}

#[cfg(feature = "ocr")]
fn default_ocr_engine(
    tessdata_dir: Option<&Path>,
) -> Result<Box<dyn OcrEngine + Send + Sync>, ExtractionError> {
    let engine = super::ocr::BundledTesseract::new(tessdata_dir)?;
    Ok(Box::new(engine))
}

#[cfg(not(feature = "ocr"))]
fn default_ocr_engine(
    tessdata_dir: Option<&Path>,
) -> Result<Box<dyn OcrEngine + Send + Sync>, ExtractionError> {
    if let Some(dir) = tessdata_dir {
        tracing::warn!(
            tessdata = %dir.display(),
            "Tessdata directory configured but OCR support is not compiled in"
        );
    }
    tracing::warn!("Built without the `ocr` feature, image uploads will fail");
    Ok(Box::new(super::ocr::UnavailableOcr))
}

impl TextExtractor for DocumentExtractor {
    fn extract(&self, bytes: &[u8], kind: DocumentKind) -> Result<ExtractionResult, ExtractionError> {
        tracing::info!(kind = kind.as_str(), bytes = bytes.len(), "Starting text extraction");
        let started = Instant::now();

        let result = match kind {
            DocumentKind::Pdf => ExtractionResult {
                method: ExtractionMethod::PdfDirect,
                text: self.pdf_extractor.extract_text(bytes)?,
            },
            DocumentKind::Image => {
                let page = self.ocr_engine.ocr_image(bytes)?;
                tracing::debug!(confidence = page.confidence, "OCR finished");
                ExtractionResult {
                    method: ExtractionMethod::TesseractOcr,
                    text: page.text,
                }
            }
        };

        tracing::info!(
            method = ?result.method,
            chars = result.char_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Text extraction complete"
        );

        Ok(result)
    }
}

/// Run a blocking extraction on tokio's blocking pool, bounded by `limit`.
///
/// The task first takes a permit from `slots` and holds it until the
/// blocking thread returns. `limit` covers both the wait for a permit and
/// the extraction. On expiry the caller gets `TimedOut` immediately; the
/// blocking thread runs to completion in the background, still holding its
/// permit, and its result is discarded. A panic inside the extraction
/// library surfaces as `TaskFailed`.
pub async fn extract_with_timeout(
    extractor: Arc<dyn TextExtractor>,
    slots: Arc<Semaphore>,
    bytes: Vec<u8>,
    kind: DocumentKind,
    limit: Duration,
) -> Result<ExtractionResult, ExtractionError> {
    let run = async move {
        let permit = slots
            .acquire_owned()
            .await
            .map_err(|e| ExtractionError::TaskFailed(e.to_string()))?;
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            extractor.extract(&bytes, kind)
        })
        .await
        .map_err(|join_error| {
            tracing::error!(error = %join_error, "Extraction task aborted");
            ExtractionError::TaskFailed(join_error.to_string())
        })?
    };

    match tokio::time::timeout(limit, run).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(timeout_ms = limit.as_millis() as u64, "Extraction timed out");
            Err(ExtractionError::TimedOut(limit))
        }
    }
}
