use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use outreach_core::MediaCategory;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub storage: String,
    pub categories: Vec<MediaCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_payload_bytes: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Storage is unavailable", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (status_code, status, storage) = match state.storage.health_check().await {
        Ok(()) => (StatusCode::OK, "healthy", "ok".to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "Storage health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", e.to_string())
        }
    };

    (
        status_code,
        Json(HealthResponse {
            status: status.to_string(),
            storage,
            categories: state.policy.categories().collect(),
            max_payload_bytes: state.config.max_payload_bytes,
        }),
    )
}
