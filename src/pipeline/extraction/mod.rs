pub mod types;
pub mod pdf;
pub mod ocr;
pub mod orchestrator;

pub use types::*;
pub use pdf::*;
pub use ocr::*;
pub use orchestrator::*;

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Tesseract OCR initialization failed: {0}")]
    OcrInit(String),

    #[error("OCR processing failed: {0}")]
    OcrProcessing(String),

    #[error("OCR is not available in this build")]
    OcrUnavailable,

    #[error("Tessdata not found at: {0}")]
    TessdataNotFound(PathBuf),

    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("Extraction did not finish within {0:?}")]
    TimedOut(Duration),

    #[error("Extraction task failed: {0}")]
    TaskFailed(String),
}
