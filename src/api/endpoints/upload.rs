//! Lab report upload: extract text, recognise lab values.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{timestamp_id, ApiContext};
use crate::models::LabResultRecord;
use crate::pipeline::extraction::{extract_with_timeout, DocumentKind};
use crate::pipeline::labs::SkippedMatch;

/// Multipart part that carries the document.
const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub file_id: String,
    pub file_name: String,
    pub file_size: usize,
    pub file_type: String,
    /// First characters of the extracted text.
    pub extracted_text: String,
    pub lab_results: Vec<LabResultRecord>,
    pub processed: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_matches: Vec<SkippedMatch>,
}

/// The `file` part of an upload, fully buffered.
struct UploadedFile {
    name: String,
    content_type: String,
    bytes: Vec<u8>,
}

/// `POST /api/upload`: multipart upload of a PDF or image lab report.
pub async fn upload(
    State(ctx): State<ApiContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart =
        multipart.map_err(|e| ApiError::BadRequest(format!("Expected multipart form data: {e}")))?;
    let limit = ctx.core.upload.max_file_size;

    let file = read_file_part(&mut multipart, limit)
        .await?
        .ok_or(ApiError::NoFileProvided)?;

    let kind = DocumentKind::from_mime(&file.content_type)
        .filter(|_| ctx.core.upload.accepts(&file.content_type))
        .ok_or_else(|| ApiError::UnsupportedFileType(file.content_type.clone()))?;

    if file.bytes.len() > limit {
        return Err(ApiError::FileTooLarge {
            size: file.bytes.len(),
            limit,
        });
    }

    let file_size = file.bytes.len();
    tracing::info!(
        file_name = %file.name,
        file_type = %file.content_type,
        file_size,
        "Processing upload"
    );

    let extraction = extract_with_timeout(
        ctx.core.extractor(),
        ctx.core.extraction_slots(),
        file.bytes,
        kind,
        ctx.core.upload.extraction_timeout,
    )
    .await?;

    let scan = ctx.core.recognizer().scan(&extraction.text);
    let abnormal = scan.records.iter().filter(|r| r.is_abnormal).count();
    tracing::info!(
        lab_results = scan.records.len(),
        abnormal,
        skipped = scan.skipped.len(),
        "Upload processed"
    );

    Ok(Json(UploadResponse {
        success: true,
        file_id: timestamp_id("file"),
        file_name: file.name,
        file_size,
        file_type: file.content_type,
        extracted_text: extraction.excerpt(ctx.core.upload.excerpt_chars),
        lab_results: scan.records,
        processed: true,
        skipped_matches: scan.skipped,
    }))
}

/// Buffer the first `file` part; other parts are ignored.
async fn read_file_part(
    multipart: &mut Multipart,
    limit: usize,
) -> Result<Option<UploadedFile>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let name = field.file_name().unwrap_or("document").to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;

        return Ok(Some(UploadedFile {
            name,
            content_type,
            bytes: bytes.to_vec(),
        }));
    }

    Ok(None)
}

fn multipart_error(err: MultipartError, limit: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        // Body limit hit before the part was complete; the real size is unknown.
        ApiError::FileTooLarge { size: limit + 1, limit }
    } else {
        tracing::warn!(error = %err, "Malformed multipart body");
        ApiError::BadRequest(format!("Malformed multipart body: {}", err.body_text()))
    }
}
