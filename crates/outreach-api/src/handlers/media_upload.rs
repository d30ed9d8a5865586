use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use outreach_core::StoredFileReference;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{ErrorResponse, HttpAppError, ValidationErrorResponse};
use crate::state::AppState;
use crate::utils::upload::extract_upload;

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadData {
    pub files: Vec<StoredFileReference>,
    /// Non-fatal findings, e.g. ignored fields
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub success: bool,
    pub data: UploadData,
}

/// Upload media for an owner
///
/// Accepts one multipart request whose field names are category field names
/// (`photos`, `videos`, `documents`, `avatar`). Every received file is re-validated;
/// a single violation rejects the whole request and nothing is stored.
#[utoipa::path(
    post,
    path = "/api/v0/owners/{owner_id}/media",
    tag = "media",
    params(
        ("owner_id" = String, Path, description = "Owning entity identifier")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "All files accepted and stored", body = UploadResponse),
        (status = 400, description = "Policy violations", body = ValidationErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 413, description = "Request body too large", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, multipart), fields(owner_id = %owner_id, operation = "upload_media"))]
pub async fn upload_media(
    State(state): State<Arc<AppState>>,
    Path(owner_id): Path<String>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let upload = extract_upload(multipart).await?;
    let receipt = state.uploads.ingest(&owner_id, upload).await?;

    Ok(Json(UploadResponse {
        success: true,
        data: UploadData {
            files: receipt.files,
            warnings: receipt.warnings,
        },
    }))
}
