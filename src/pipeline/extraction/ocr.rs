use super::types::{OcrEngine, OcrPageResult};
use super::ExtractionError;

/// Bundled Tesseract OCR engine.
/// Only available when compiled with the `ocr` feature flag.
#[cfg(feature = "ocr")]
pub struct BundledTesseract {
    tessdata_dir: Option<std::path::PathBuf>,
    lang: String,
}

#[cfg(feature = "ocr")]
impl BundledTesseract {
    /// Initialize with an optional tessdata directory. Without one, Tesseract
    /// resolves its data through `TESSDATA_PREFIX` or its compiled-in default.
    pub fn new(tessdata_dir: Option<&std::path::Path>) -> Result<Self, ExtractionError> {
        let lang = crate::config::OCR_LANGUAGE;
        if let Some(dir) = tessdata_dir {
            if !dir.join(format!("{lang}.traineddata")).exists() {
                return Err(ExtractionError::TessdataNotFound(dir.to_path_buf()));
            }
            tracing::info!(tessdata = %dir.display(), lang, "Tesseract data found");
        }

        Ok(Self {
            tessdata_dir: tessdata_dir.map(|d| d.to_path_buf()),
            lang: lang.to_string(),
        })
    }
}

#[cfg(feature = "ocr")]
impl OcrEngine for BundledTesseract {
    fn ocr_image(&self, image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError> {
        let tessdata_str = match &self.tessdata_dir {
            Some(dir) => Some(
                dir.to_str()
                    .ok_or_else(|| ExtractionError::OcrInit("Invalid tessdata path".into()))?,
            ),
            None => None,
        };

        let tess = tesseract::Tesseract::new(tessdata_str, Some(&self.lang))
            .map_err(|e| ExtractionError::OcrInit(format!("{e:?}")))?;

        let mut tess = tess
            .set_image_from_mem(image_bytes)
            .map_err(|e| ExtractionError::OcrProcessing(format!("{e:?}")))?;

        let text = tess
            .get_text()
            .map_err(|e| ExtractionError::OcrProcessing(format!("{e:?}")))?;

        let confidence = tess.mean_text_conf().max(0) as f32 / 100.0;

        Ok(OcrPageResult { text, confidence })
    }
}

/// Stand-in used when the binary is built without the `ocr` feature.
/// Every image upload fails with `OcrUnavailable`.
pub struct UnavailableOcr;

impl OcrEngine for UnavailableOcr {
    fn ocr_image(&self, _image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError> {
        Err(ExtractionError::OcrUnavailable)
    }
}

/// Mock OCR engine for unit testing without Tesseract.
pub struct MockOcrEngine {
    pub text: String,
    pub confidence: f32,
}

impl MockOcrEngine {
    pub fn new(text: &str, confidence: f32) -> Self {
        Self {
            text: text.to_string(),
            confidence,
        }
    }
}

impl OcrEngine for MockOcrEngine {
    fn ocr_image(&self, _image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError> {
        Ok(OcrPageResult {
            text: self.text.clone(),
            confidence: self.confidence,
        })
    }
}
