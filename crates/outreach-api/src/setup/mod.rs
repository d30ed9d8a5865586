//! Application setup and initialization

pub mod routes;
pub mod server;

use crate::services::upload::{IngestionGuard, UploadService};
use crate::state::AppState;
use anyhow::{Context, Result};
use outreach_core::{PolicyTable, ServerConfig};
use std::sync::Arc;

/// Initialize tracing, storage, services and routes.
pub async fn initialize_app(
    config: ServerConfig,
    policy: PolicyTable,
) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry(crate::telemetry::init::json_requested())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    build_app(config, policy).await
}

/// Build state and router without touching global tracing state.
pub async fn build_app(
    config: ServerConfig,
    policy: PolicyTable,
) -> Result<(Arc<AppState>, axum::Router)> {
    config.validate().context("Configuration validation failed")?;
    policy.validate().context("Upload policy validation failed")?;

    for entry in policy.entries() {
        tracing::info!(
            category = %entry.category,
            field = entry.category.field_name(),
            max_size_bytes = entry.max_size_bytes,
            max_count = entry.max_count,
            aggregate_ceiling_bytes = ?entry.aggregate_ceiling_bytes,
            allowed_types = %entry.allowed_mime_types.iter().cloned().collect::<Vec<_>>().join(","),
            "Upload category enabled"
        );
    }

    let storage = outreach_storage::create_storage(&config)
        .await
        .context("Failed to initialize storage")?;

    let policy = Arc::new(policy);
    let guard = Arc::new(IngestionGuard::new(policy.clone(), config.max_payload_bytes));
    let uploads = UploadService::new(guard, storage.clone());

    let state = Arc::new(AppState {
        config,
        policy,
        storage,
        uploads,
    });

    let router = routes::setup_routes(state.clone())?;

    Ok((state, router))
}
