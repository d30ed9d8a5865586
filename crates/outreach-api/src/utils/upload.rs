//! Multipart extraction for upload handlers

use crate::services::upload::IncomingUpload;
use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use outreach_core::{AppError, CandidateFile};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!("Request body too large: {}", e.body_text()))
    } else {
        AppError::BadRequest(format!("Failed to read multipart: {}", e.body_text()))
    }
}

/// Read every part of a multipart body, grouped by field name.
///
/// Each part is treated as one file. Parts without a file name keep an empty name so the
/// ingestion guard reports them instead of silently dropping them.
pub async fn extract_upload(mut multipart: Multipart) -> Result<IncomingUpload, AppError> {
    let mut upload = IncomingUpload::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();
        let file_name = field.file_name().map(|s| s.to_string()).unwrap_or_default();
        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        let data = field.bytes().await.map_err(multipart_error)?;

        tracing::debug!(
            field = %field_name,
            file_name = %file_name,
            content_type = %content_type,
            size_bytes = data.len(),
            "Received multipart part"
        );

        upload.push(&field_name, CandidateFile::new(file_name, content_type, data));
    }

    Ok(upload)
}
