//! Application state shared by all handlers.

use crate::services::upload::UploadService;
use outreach_core::{PolicyTable, ServerConfig};
use outreach_storage::Storage;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub policy: Arc<PolicyTable>,
    pub storage: Arc<dyn Storage>,
    pub uploads: UploadService,
}
