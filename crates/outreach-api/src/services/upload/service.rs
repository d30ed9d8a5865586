//! Upload service
//!
//! Runs the ingestion guard over a received request and persists the admitted files.
//! Persistence is all-or-nothing as well: when one write fails, the files already
//! written for the same request are removed again.

use super::guard::{IncomingUpload, IngestionGuard};
use crate::error::HttpAppError;
use outreach_core::{AppError, StoredFileReference};
use outreach_storage::keys::key_belongs_to;
use outreach_storage::{Storage, StorageError};
use std::sync::Arc;

/// Files persisted for one accepted request
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    pub files: Vec<StoredFileReference>,
    pub warnings: Vec<String>,
}

#[derive(Clone)]
pub struct UploadService {
    guard: Arc<IngestionGuard>,
    storage: Arc<dyn Storage>,
}

impl UploadService {
    pub fn new(guard: Arc<IngestionGuard>, storage: Arc<dyn Storage>) -> Self {
        Self { guard, storage }
    }

    pub fn guard(&self) -> &IngestionGuard {
        &self.guard
    }

    #[tracing::instrument(skip(self, upload), fields(owner_id = %owner_id, file_count = upload.file_count()))]
    pub async fn ingest(
        &self,
        owner_id: &str,
        upload: IncomingUpload,
    ) -> Result<UploadReceipt, HttpAppError> {
        let admitted = self.guard.enforce(upload)?;

        let mut stored: Vec<StoredFileReference> = Vec::with_capacity(admitted.file_count());
        for batch in &admitted.batches {
            for file in &batch.files {
                match self.storage.store(owner_id, batch.category, file).await {
                    Ok(reference) => stored.push(reference),
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            file_name = %file.name,
                            category = %batch.category,
                            stored_count = stored.len(),
                            "Failed to persist admitted file, rolling back request"
                        );
                        self.rollback(&stored).await;
                        return Err(AppError::from(e).into());
                    }
                }
            }
        }

        tracing::info!(
            stored_count = stored.len(),
            warning_count = admitted.warnings.len(),
            "Upload accepted"
        );

        Ok(UploadReceipt {
            files: stored,
            warnings: admitted.warnings,
        })
    }

    async fn rollback(&self, stored: &[StoredFileReference]) {
        for reference in stored {
            if let Err(e) = self.storage.delete(&reference.path).await {
                tracing::warn!(
                    error = %e,
                    path = %reference.path,
                    "Failed to remove file during rollback"
                );
            }
        }
    }

    /// Delete one stored file on behalf of `owner_id`.
    ///
    /// Ownership is decided by the storage key, which must lie in the directory of the
    /// owner named in the request path. The reference's own `owner_id` is not trusted.
    #[tracing::instrument(skip(self, reference), fields(owner_id = %owner_id, path = %reference.path))]
    pub async fn delete(
        &self,
        owner_id: &str,
        reference: &StoredFileReference,
    ) -> Result<(), AppError> {
        if reference.owner_id != owner_id
            || !key_belongs_to(&reference.path, owner_id, reference.category)
        {
            tracing::warn!(
                claimed_owner = %reference.owner_id,
                "Delete refused: reference outside the owner's storage"
            );
            return Err(AppError::Forbidden(
                "File reference does not belong to this owner".to_string(),
            ));
        }

        match self.storage.delete(&reference.path).await {
            Ok(()) => {
                tracing::info!(file_id = %reference.id, "Stored file deleted");
                Ok(())
            }
            Err(StorageError::NotFound(_)) => {
                Err(AppError::NotFound("File not found".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
