//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::models::{FieldError, ValidationErrors};
use crate::pipeline::extraction::ExtractionError;

/// Error payload returned by every endpoint: `{success: false, error, code}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("No file provided")]
    NoFileProvided,
    #[error("File too large: {size} bytes (limit {limit})")]
    FileTooLarge { size: usize, limit: usize },
    #[error("Text extraction failed: {0}")]
    ExtractionFailed(String),
    #[error("Text extraction timed out")]
    ExtractionTimedOut,
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut details = None;
        let (status, code, message) = match self {
            ApiError::UnsupportedFileType(mime) => {
                tracing::info!(mime = %mime, "Rejected upload with unsupported type");
                (
                    StatusCode::BAD_REQUEST,
                    "UNSUPPORTED_FILE_TYPE",
                    "Tipo de arquivo não suportado".to_string(),
                )
            }
            ApiError::NoFileProvided => (
                StatusCode::BAD_REQUEST,
                "NO_FILE_PROVIDED",
                "Nenhum arquivo fornecido".to_string(),
            ),
            ApiError::FileTooLarge { limit, .. } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "FILE_TOO_LARGE",
                format!("Arquivo muito grande. Máximo {}.", size_label(limit)),
            ),
            ApiError::ExtractionFailed(detail) => {
                tracing::error!(detail = %detail, "Text extraction failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "EXTRACTION_FAILED",
                    "Erro ao extrair texto do arquivo".to_string(),
                )
            }
            ApiError::ExtractionTimedOut => (
                StatusCode::GATEWAY_TIMEOUT,
                "EXTRACTION_TIMED_OUT",
                "Tempo esgotado ao extrair texto do arquivo".to_string(),
            ),
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail),
            ApiError::Validation(errors) => {
                let message = errors.to_string();
                details = Some(errors.0);
                (StatusCode::BAD_REQUEST, "VALIDATION_FAILED", message)
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "Erro interno do servidor".to_string(),
                )
            }
        };

        let body = ErrorBody {
            success: false,
            error: message,
            code,
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Upload limit for messages, rounded up to whole MB, or KB below 1 MB.
fn size_label(bytes: usize) -> String {
    const KIB: usize = 1024;
    const MIB: usize = 1024 * KIB;
    if bytes >= MIB {
        format!("{}MB", bytes.div_ceil(MIB))
    } else {
        format!("{}KB", bytes.div_ceil(KIB))
    }
}

impl From<ExtractionError> for ApiError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::TimedOut(_) => ApiError::ExtractionTimedOut,
            other => ApiError::ExtractionFailed(other.to_string()),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}
