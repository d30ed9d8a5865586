//! Bulk deletion coordinator
//!
//! Deletes stored files one request per reference. A failure is recorded and the
//! next reference is processed; the outcome always carries both lists.

use async_trait::async_trait;
use futures::{stream, StreamExt};
use outreach_core::StoredFileReference;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeleteError {
    #[error("File not found")]
    NotFound,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Delete timed out")]
    Timeout,
}

/// Persistence-side delete of one reference on behalf of an owner.
#[async_trait]
pub trait FileDeleter: Send + Sync {
    async fn delete(
        &self,
        owner_id: &str,
        reference: &StoredFileReference,
    ) -> Result<(), DeleteError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct FailedDeletion {
    pub reference: StoredFileReference,
    pub error: DeleteError,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkDeleteOutcome {
    pub succeeded: Vec<StoredFileReference>,
    pub failed: Vec<FailedDeletion>,
}

impl BulkDeleteOutcome {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn summary(&self) -> String {
        format!("{} deleted, {} failed", self.succeeded.len(), self.failed.len())
    }
}

/// Cumulative progress, `completed` out of `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkDeleteProgress {
    pub completed: usize,
    pub total: usize,
}

enum ItemResult {
    Deleted(StoredFileReference),
    Failed(FailedDeletion),
}

pub struct BulkDeleteCoordinator {
    deleter: Arc<dyn FileDeleter>,
    concurrency: usize,
}

impl BulkDeleteCoordinator {
    /// Sequential coordinator.
    pub fn new(deleter: Arc<dyn FileDeleter>) -> Self {
        Self {
            deleter,
            concurrency: 1,
        }
    }

    /// Allow up to `concurrency` deletes in flight (minimum 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    #[tracing::instrument(skip(self, references, progress), fields(owner_id = %owner_id, total = references.len(), concurrency = self.concurrency))]
    pub async fn bulk_delete(
        &self,
        owner_id: &str,
        references: Vec<StoredFileReference>,
        progress: Option<&UnboundedSender<BulkDeleteProgress>>,
    ) -> BulkDeleteOutcome {
        let total = references.len();
        let mut outcome = BulkDeleteOutcome::default();
        let deleter = &self.deleter;

        let mut results = stream::iter(references)
            .map(|reference| async move {
                match deleter.delete(owner_id, &reference).await {
                    Ok(()) => ItemResult::Deleted(reference),
                    Err(error) => ItemResult::Failed(FailedDeletion { reference, error }),
                }
            })
            .buffered(self.concurrency);

        let mut completed = 0;
        while let Some(result) = results.next().await {
            completed += 1;
            // Results arrive in input order on this single consumer.
            match result {
                ItemResult::Deleted(reference) => {
                    tracing::debug!(path = %reference.path, "Deleted stored file");
                    outcome.succeeded.push(reference);
                }
                ItemResult::Failed(failure) => {
                    tracing::warn!(
                        path = %failure.reference.path,
                        error = %failure.error,
                        "Failed to delete stored file"
                    );
                    outcome.failed.push(failure);
                }
            }

            if let Some(progress) = progress {
                let _ = progress.send(BulkDeleteProgress { completed, total });
            }
        }

        tracing::info!(
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "Bulk delete finished"
        );
        outcome
    }
}
