//! Domain methods for the ingestion API client.

use crate::bulk_delete::{DeleteError, FileDeleter};
use crate::ApiClient;
use async_trait::async_trait;
use outreach_core::StoredFileReference;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct DeleteResponse {
    success: bool,
    message: Option<String>,
}

impl ApiClient {
    /// `DELETE /api/v0/owners/{owner_id}/media` with the reference as JSON body.
    pub async fn delete_file(
        &self,
        owner_id: &str,
        reference: &StoredFileReference,
    ) -> Result<(), DeleteError> {
        let request = self
            .client()
            .delete(self.media_url(owner_id))
            .timeout(self.timeout())
            .json(reference);

        let response = self.apply_auth(request).send().await.map_err(|e| {
            if e.is_timeout() {
                DeleteError::Timeout
            } else {
                DeleteError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        let body: Option<DeleteResponse> = response.json().await.ok();
        let message = body.as_ref().and_then(|b| b.message.clone());

        match status.as_u16() {
            200..=299 if body.as_ref().map(|b| b.success).unwrap_or(true) => Ok(()),
            404 => Err(DeleteError::NotFound),
            403 => Err(DeleteError::Forbidden(
                message.unwrap_or_else(|| "Reference belongs to another owner".to_string()),
            )),
            code => Err(DeleteError::Rejected {
                status: code,
                message: message
                    .unwrap_or_else(|| format!("Delete failed with status {}", code)),
            }),
        }
    }
}

#[async_trait]
impl FileDeleter for ApiClient {
    async fn delete(
        &self,
        owner_id: &str,
        reference: &StoredFileReference,
    ) -> Result<(), DeleteError> {
        self.delete_file(owner_id, reference).await
    }
}
