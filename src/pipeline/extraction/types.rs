use serde::{Deserialize, Serialize};

use super::ExtractionError;
use crate::config::mime_essence;

/// Which extraction path a declared MIME type takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Pdf,
    Image,
}

impl DocumentKind {
    /// Classify a declared content type. `None` means unsupported.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime_essence(mime).as_str() {
            "application/pdf" => Some(Self::Pdf),
            "image/jpeg" | "image/jpg" | "image/png" => Some(Self::Image),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Image => "image",
        }
    }
}

/// How text was extracted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExtractionMethod {
    PdfDirect,
    TesseractOcr,
}

/// Text pulled out of one uploaded document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractionResult {
    pub method: ExtractionMethod,
    pub text: String,
}

impl ExtractionResult {
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// The first `max_chars` characters of the text.
    pub fn excerpt(&self, max_chars: usize) -> String {
        self.text.chars().take(max_chars).collect()
    }
}

/// Raw OCR result from the engine
#[derive(Debug, Clone)]
pub struct OcrPageResult {
    pub text: String,
    /// Mean word confidence, 0.0 to 1.0.
    pub confidence: f32,
}

/// OCR engine abstraction (allows mocking for tests)
pub trait OcrEngine {
    fn ocr_image(&self, image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError>;
}

/// PDF text extraction abstraction
pub trait PdfExtractor {
    fn extract_text(&self, pdf_bytes: &[u8]) -> Result<String, ExtractionError>;
}

/// Turns document bytes into plain text. Blocking; callers run it off the async runtime.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8], kind: DocumentKind) -> Result<ExtractionResult, ExtractionError>;
}
