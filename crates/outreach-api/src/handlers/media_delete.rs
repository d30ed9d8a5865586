use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use outreach_core::StoredFileReference;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
}

/// Delete one stored file
///
/// The body is the reference returned by the upload endpoint.
#[utoipa::path(
    delete,
    path = "/api/v0/owners/{owner_id}/media",
    tag = "media",
    params(
        ("owner_id" = String, Path, description = "Owning entity identifier")
    ),
    request_body = StoredFileReference,
    responses(
        (status = 200, description = "File deleted", body = DeleteResponse),
        (status = 403, description = "Reference belongs to another owner", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, reference), fields(owner_id = %owner_id, operation = "delete_media"))]
pub async fn delete_media(
    State(state): State<Arc<AppState>>,
    Path(owner_id): Path<String>,
    ValidatedJson(reference): ValidatedJson<StoredFileReference>,
) -> Result<Json<DeleteResponse>, HttpAppError> {
    state.uploads.delete(&owner_id, &reference).await?;
    Ok(Json(DeleteResponse { success: true }))
}
