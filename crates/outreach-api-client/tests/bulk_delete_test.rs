mod helpers;

use helpers::{client, create_test_jpeg, spawn_ingestion_server};
use outreach_api_client::{
    BulkDeleteCoordinator, DeleteError, TransferOrchestrator, TransferOutcome, TransferRequest,
};
use outreach_core::{CandidateFile, MediaCategory};
use std::sync::Arc;
use tokio::sync::mpsc::unbounded_channel;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_bulk_delete_over_http_continues_past_missing_file() {
    let server = spawn_ingestion_server().await;
    let api = client(&server.base_url);

    let files: Vec<CandidateFile> = (1..=5)
        .map(|i| {
            CandidateFile::new(
                format!("room-{}.jpg", i),
                "image/jpeg",
                create_test_jpeg(8 + i, 8 + i),
            )
        })
        .collect();
    let outcome = TransferOrchestrator::new(api.clone())
        .transfer(
            TransferRequest::new("visit-9", MediaCategory::Photo, files),
            None,
            CancellationToken::new(),
        )
        .await
        .expect("upload should succeed");
    let references = match outcome {
        TransferOutcome::Completed(receipt) => receipt.files,
        TransferOutcome::Cancelled => panic!("unexpected cancellation"),
    };
    assert_eq!(references.len(), 5);

    // Third file disappears before the bulk run.
    api.delete_file("visit-9", &references[2]).await.unwrap();

    let coordinator = BulkDeleteCoordinator::new(Arc::new(api.clone()));
    let (tx, mut rx) = unbounded_channel();
    let outcome = coordinator
        .bulk_delete("visit-9", references.clone(), Some(&tx))
        .await;
    drop(tx);

    assert_eq!(outcome.succeeded.len(), 4);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].reference, references[2]);
    assert_eq!(outcome.failed[0].error, DeleteError::NotFound);
    assert_eq!(outcome.summary(), "4 deleted, 1 failed");

    let mut completed = Vec::new();
    while let Some(event) = rx.recv().await {
        assert_eq!(event.total, 5);
        completed.push(event.completed);
    }
    assert_eq!(completed, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_delete_for_other_owner_is_forbidden() {
    let server = spawn_ingestion_server().await;
    let api = client(&server.base_url);

    let outcome = TransferOrchestrator::new(api.clone())
        .transfer(
            TransferRequest::new(
                "visit-1",
                MediaCategory::Photo,
                vec![CandidateFile::new("a.jpg", "image/jpeg", create_test_jpeg(8, 8))],
            ),
            None,
            CancellationToken::new(),
        )
        .await
        .unwrap();
    let TransferOutcome::Completed(receipt) = outcome else {
        panic!("unexpected cancellation");
    };

    let err = api
        .delete_file("visit-2", &receipt.files[0])
        .await
        .unwrap_err();
    assert!(matches!(err, DeleteError::Forbidden(_)));
}
