//! End-to-end client pipeline: validate, recompress, transfer.

use crate::progress::TransferProgressEvent;
use crate::transfer::{TransferError, TransferOrchestrator, TransferOutcome, TransferRequest};
use outreach_core::{CandidateFile, MediaCategory, PolicyError, PolicyTable};
use outreach_processing::{
    validate, BatchViolation, CompressionProgress, CompressionStats, CompressionWarning,
    Recompressor, RejectedFile,
};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Batch-level violations, with the per-file rejections found in the same pass
    #[error("Batch rejected: {}", join_violations(.violations))]
    BatchRejected {
        violations: Vec<BatchViolation>,
        rejected: Vec<RejectedFile>,
    },

    #[error("No file passed validation ({} rejected)", .0.len())]
    NothingToUpload(Vec<RejectedFile>),

    #[error(transparent)]
    Transfer(#[from] TransferError),
}

fn join_violations(violations: &[BatchViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Optional progress channels for the two long-running stages.
#[derive(Debug, Clone, Default)]
pub struct PipelineProgress {
    pub compression: Option<UnboundedSender<CompressionProgress>>,
    pub transfer: Option<UnboundedSender<TransferProgressEvent>>,
}

#[derive(Debug, Clone)]
pub struct UploadReport {
    pub category: MediaCategory,
    /// Files dropped by client-side validation
    pub rejected: Vec<RejectedFile>,
    pub compression: CompressionStats,
    /// Files sent unchanged because they could not be recompressed
    pub warnings: Vec<CompressionWarning>,
    pub outcome: TransferOutcome,
}

#[derive(Clone, Debug)]
pub struct UploadPipeline {
    policy: Arc<PolicyTable>,
    recompressor: Recompressor,
    orchestrator: TransferOrchestrator,
    compression_concurrency: usize,
}

impl UploadPipeline {
    pub fn new(
        policy: Arc<PolicyTable>,
        recompressor: Recompressor,
        orchestrator: TransferOrchestrator,
    ) -> Self {
        Self {
            policy,
            recompressor,
            orchestrator,
            compression_concurrency: 1,
        }
    }

    pub fn with_compression_concurrency(mut self, concurrency: usize) -> Self {
        self.compression_concurrency = concurrency.max(1);
        self
    }

    /// Validate `files`, recompress the accepted ones and transfer them as one batch.
    ///
    /// Per-file rejections are reported and the rest proceeds; batch-level violations
    /// stop the run before any network call.
    #[tracing::instrument(skip(self, files, progress, cancel), fields(owner_id = %owner_id, category = %category, file_count = files.len()))]
    pub async fn run(
        &self,
        owner_id: &str,
        category: MediaCategory,
        files: Vec<CandidateFile>,
        progress: PipelineProgress,
        cancel: CancellationToken,
    ) -> Result<UploadReport, PipelineError> {
        let outcome = validate(&files, category, &self.policy)?;
        let rejected = outcome.rejected.clone();

        for file in &rejected {
            tracing::info!(
                file_name = %file.file.name,
                reasons = ?file.reasons.iter().map(|r| r.reason()).collect::<Vec<_>>(),
                "File rejected by client-side validation"
            );
        }

        let accepted = outcome
            .into_admissible()
            .map_err(|violations| PipelineError::BatchRejected {
                violations,
                rejected: rejected.clone(),
            })?;
        if accepted.is_empty() {
            return Err(PipelineError::NothingToUpload(rejected));
        }

        let results = self
            .recompressor
            .compress_batch(
                accepted,
                category,
                self.compression_concurrency,
                progress.compression.as_ref(),
            )
            .await;
        drop(progress.compression);

        let compression = CompressionStats::from_results(&results);
        let warnings: Vec<CompressionWarning> =
            results.iter().filter_map(|r| r.warning().cloned()).collect();
        let outputs: Vec<CandidateFile> = results.into_iter().map(|r| r.output).collect();

        let request = TransferRequest::new(owner_id, category, outputs);
        let outcome = self
            .orchestrator
            .transfer(request, progress.transfer, cancel)
            .await?;

        Ok(UploadReport {
            category,
            rejected,
            compression,
            warnings,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ApiClient;
    use std::time::Duration;

    // Nothing listens here; these cases must fail before any network call.
    fn pipeline() -> UploadPipeline {
        let client =
            ApiClient::new("http://127.0.0.1:9", "token", Duration::from_secs(1)).unwrap();
        UploadPipeline::new(
            Arc::new(PolicyTable::defaults()),
            Recompressor::default(),
            TransferOrchestrator::new(client),
        )
    }

    #[tokio::test]
    async fn test_batch_violation_keeps_file_rejections() {
        let files = vec![
            CandidateFile::new("a.jpg", "image/jpeg", vec![1u8; 10]),
            CandidateFile::new("b.gif", "image/gif", vec![1u8; 10]),
        ];

        let err = pipeline()
            .run(
                "visit-1",
                MediaCategory::Avatar,
                files,
                PipelineProgress::default(),
                CancellationToken::new(),
            )
            .await
            .unwrap_err();

        match err {
            PipelineError::BatchRejected {
                violations,
                rejected,
            } => {
                assert_eq!(
                    violations,
                    vec![BatchViolation::TooManyFiles { count: 2, max: 1 }]
                );
                assert_eq!(rejected.len(), 1);
                assert_eq!(rejected[0].file.name, "b.gif");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_all_rejected_means_nothing_to_upload() {
        let files = vec![CandidateFile::new("notes.pdf", "application/pdf", vec![1u8; 10])];

        let err = pipeline()
            .run(
                "visit-1",
                MediaCategory::Photo,
                files,
                PipelineProgress::default(),
                CancellationToken::new(),
            )
            .await
            .unwrap_err();

        match err {
            PipelineError::NothingToUpload(rejected) => {
                assert_eq!(rejected.len(), 1);
                assert_eq!(rejected[0].file.name, "notes.pdf");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_category() {
        let pipeline = UploadPipeline::new(
            Arc::new(PolicyTable::default()),
            Recompressor::default(),
            pipeline().orchestrator,
        );
        let err = pipeline
            .run(
                "visit-1",
                MediaCategory::Photo,
                vec![],
                PipelineProgress::default(),
                CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Policy(_)));
    }
}
