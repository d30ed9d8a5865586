use crate::{LocalStorage, Storage, StorageResult};
use outreach_core::ServerConfig;
use std::sync::Arc;

/// Create the storage backend described by the server configuration
pub async fn create_storage(config: &ServerConfig) -> StorageResult<Arc<dyn Storage>> {
    let storage = LocalStorage::new(&config.storage_path, config.public_base_url.clone()).await?;
    tracing::info!(
        path = %config.storage_path,
        base_url = %config.public_base_url,
        "Local storage initialized"
    );
    Ok(Arc::new(storage))
}
