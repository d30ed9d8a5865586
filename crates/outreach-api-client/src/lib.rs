//! Client side of the outreach upload pipeline.
//!
//! Provides the HTTP client for the ingestion API with bearer auth, the transfer
//! orchestrator (streamed multipart upload with byte progress, cancellation and
//! timeout), the bulk deletion coordinator and the end-to-end upload pipeline.
//! The CLI uses this crate directly.

pub mod api;
pub mod bulk_delete;
pub mod config;
pub mod files;
pub mod pipeline;
pub mod progress;
pub mod transfer;

use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

/// Versioned API prefix served by the ingestion server.
pub const API_PREFIX: &str = "/api/v0";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the ingestion API.
///
/// The bearer token is opaque: it is attached to every request and never inspected.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: String,
    timeout: Duration,
}

impl ApiClient {
    /// `timeout` bounds every request issued through this client.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            timeout,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let token = config.require_token()?;
        Self::new(config.api_url.clone(), token, config.transfer_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// URL of the media collection of one owner.
    pub fn media_url(&self, owner_id: &str) -> String {
        self.build_url(&format!(
            "{}/owners/{}/media",
            API_PREFIX,
            urlencoding::encode(owner_id)
        ))
    }

    pub(crate) fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.bearer_auth(&self.token)
    }

    /// Raw client for custom requests. Caller must apply auth.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

pub use bulk_delete::{
    BulkDeleteCoordinator, BulkDeleteOutcome, BulkDeleteProgress, DeleteError, FailedDeletion,
    FileDeleter,
};
pub use config::ClientConfig;
pub use pipeline::{PipelineError, PipelineProgress, UploadPipeline, UploadReport};
pub use progress::TransferProgressEvent;
pub use transfer::{
    FieldError, TransferError, TransferOrchestrator, TransferOutcome, TransferReceipt,
    TransferRequest,
};
