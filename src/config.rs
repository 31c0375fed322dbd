use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

use crate::pipeline::labs::ParseFailurePolicy;

/// Application-level constants
pub const APP_NAME: &str = "Labscan";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tesseract language used for every image. No auto-detection.
pub const OCR_LANGUAGE: &str = "por";

/// MIME types accepted by the upload endpoint.
pub const SUPPORTED_MIME_TYPES: &[&str] =
    &["application/pdf", "image/jpeg", "image/jpg", "image/png"];

/// Default maximum upload size (10 MB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Number of characters of extracted text echoed back to the client.
pub const EXTRACTED_TEXT_EXCERPT_CHARS: usize = 1000;

/// Default upper bound for a single extraction (PDF parse or OCR).
pub const DEFAULT_EXTRACTION_TIMEOUT_SECS: u64 = 60;

/// Default number of extractions allowed to run at once.
pub const DEFAULT_MAX_CONCURRENT_EXTRACTIONS: usize = 4;

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "info,labscan=debug,tower_http=info"
}

/// Upload and extraction policy shared by the HTTP handlers.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub allowed_mime_types: Vec<String>,
    pub max_file_size: usize,
    pub excerpt_chars: usize,
    pub extraction_timeout: Duration,
    /// Extractions that may occupy the blocking pool at once, counting
    /// ones that already timed out but are still running.
    pub max_concurrent_extractions: usize,
    pub parse_failure_policy: ParseFailurePolicy,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            allowed_mime_types: SUPPORTED_MIME_TYPES.iter().map(|m| m.to_string()).collect(),
            max_file_size: DEFAULT_MAX_UPLOAD_BYTES,
            excerpt_chars: EXTRACTED_TEXT_EXCERPT_CHARS,
            extraction_timeout: Duration::from_secs(DEFAULT_EXTRACTION_TIMEOUT_SECS),
            max_concurrent_extractions: DEFAULT_MAX_CONCURRENT_EXTRACTIONS,
            parse_failure_policy: ParseFailurePolicy::Drop,
        }
    }
}

impl UploadConfig {
    /// Whether a declared MIME type is accepted. Parameters such as
    /// `; charset=binary` are ignored and the comparison is case-insensitive.
    pub fn accepts(&self, mime: &str) -> bool {
        let essence = mime_essence(mime);
        self.allowed_mime_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(&essence))
    }
}

/// Strip MIME parameters and surrounding whitespace, lower-cased.
pub fn mime_essence(mime: &str) -> String {
    mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase()
}

/// HTTP server configuration.
///
/// Every option can also be set through the environment variable named in
/// its `env` attribute.
#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Host address to bind the server to.
    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    /// TCP port to listen on.
    #[arg(short = 'p', long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Maximum seconds a single document extraction may take.
    #[arg(long, env = "EXTRACTION_TIMEOUT", default_value_t = DEFAULT_EXTRACTION_TIMEOUT_SECS)]
    pub extraction_timeout: u64,

    /// Maximum number of document extractions running at once.
    #[arg(
        long,
        env = "MAX_CONCURRENT_EXTRACTIONS",
        default_value_t = DEFAULT_MAX_CONCURRENT_EXTRACTIONS
    )]
    pub max_concurrent_extractions: usize,

    /// Maximum accepted upload size in bytes.
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    /// Directory holding Tesseract `*.traineddata` files.
    /// Falls back to `TESSDATA_PREFIX` handling inside Tesseract when unset.
    #[arg(long, env = "TESSDATA_DIR")]
    pub tessdata_dir: Option<PathBuf>,

    /// Return lab matches whose number could not be parsed instead of
    /// dropping them silently.
    #[arg(long, env = "REPORT_SKIPPED_MATCHES")]
    pub report_skipped_matches: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
            extraction_timeout: DEFAULT_EXTRACTION_TIMEOUT_SECS,
            max_concurrent_extractions: DEFAULT_MAX_CONCURRENT_EXTRACTIONS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            tessdata_dir: None,
            report_skipped_matches: false,
        }
    }
}

impl ServerConfig {
    /// Reject values that cannot produce a working server.
    pub fn validate(&self) -> Result<(), String> {
        if self.extraction_timeout == 0 || self.extraction_timeout > 600 {
            return Err(format!(
                "Extraction timeout {}s is invalid. Must be between 1 and 600 seconds.",
                self.extraction_timeout
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err("Maximum upload size must be greater than zero.".into());
        }
        if self.max_concurrent_extractions == 0 {
            return Err("At least one concurrent extraction must be allowed.".into());
        }
        Ok(())
    }

    /// Derive the upload policy handed to the HTTP layer.
    pub fn upload_config(&self) -> UploadConfig {
        UploadConfig {
            max_file_size: self.max_upload_bytes,
            extraction_timeout: Duration::from_secs(self.extraction_timeout),
            max_concurrent_extractions: self.max_concurrent_extractions,
            parse_failure_policy: if self.report_skipped_matches {
                ParseFailurePolicy::Report
            } else {
                ParseFailurePolicy::Drop
            },
            ..UploadConfig::default()
        }
    }
}
