//! Serves stored files by key. Keys are unguessable (`{category}/{owner}/{uuid}-{name}`).

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};
use outreach_core::validation::mime_for_filename;
use outreach_core::AppError;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/files/{key}",
    tag = "files",
    params(
        ("key" = String, Path, description = "Storage key")
    ),
    responses(
        (status = 200, description = "File content"),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "get_public_file"))]
pub async fn get_public_file(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Response, HttpAppError> {
    let data = state.storage.download(&key).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime_for_filename(&key))
        .header(header::CONTENT_LENGTH, data.len())
        .header(header::CACHE_CONTROL, "private, max-age=3600")
        .body(Body::from(data))
        .map_err(|e| {
            HttpAppError::from(AppError::Internal(format!(
                "Failed to build file response: {}",
                e
            )))
        })
}
