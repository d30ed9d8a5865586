mod helpers;

use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use helpers::{client, create_test_jpeg, spawn_ingestion_server, spawn_router};
use outreach_api_client::pipeline::PipelineProgress;
use outreach_api_client::{
    TransferError, TransferOrchestrator, TransferOutcome, TransferProgressEvent, TransferRequest,
    UploadPipeline,
};
use outreach_core::{CandidateFile, MediaCategory, PolicyTable};
use outreach_processing::Recompressor;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio_util::sync::CancellationToken;

async fn drain(mut rx: UnboundedReceiver<TransferProgressEvent>) -> Vec<TransferProgressEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

fn photo(name: &str, size: u32) -> CandidateFile {
    CandidateFile::new(name, "image/jpeg", create_test_jpeg(size, size))
}

/// Accepts the request and never answers.
fn silent_router() -> Router {
    Router::new().route(
        "/api/v0/owners/{owner_id}/media",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            StatusCode::OK
        }),
    )
}

#[tokio::test]
async fn test_pipeline_uploads_with_byte_progress() {
    let server = spawn_ingestion_server().await;
    let orchestrator = TransferOrchestrator::new(client(&server.base_url)).with_chunk_size(1024);
    let pipeline = UploadPipeline::new(
        Arc::new(PolicyTable::defaults()),
        Recompressor::default(),
        orchestrator,
    );

    let files = vec![
        photo("front.jpg", 64),
        photo("side.jpg", 48),
        CandidateFile::new("notes.pdf", "application/pdf", b"%PDF-1.4".to_vec()),
    ];
    let (tx, rx) = unbounded_channel();
    let progress = PipelineProgress {
        compression: None,
        transfer: Some(tx),
    };

    let report = pipeline
        .run("visit-1", MediaCategory::Photo, files, progress, CancellationToken::new())
        .await
        .expect("pipeline should succeed");

    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.compression.files, 2);
    let receipt = match report.outcome {
        TransferOutcome::Completed(receipt) => receipt,
        TransferOutcome::Cancelled => panic!("unexpected cancellation"),
    };
    assert_eq!(receipt.files.len(), 2);
    assert!(receipt.files.iter().all(|f| f.owner_id == "visit-1"));

    let events = drain(rx).await;
    assert!(!events.is_empty());
    assert!(events
        .windows(2)
        .all(|w| w[0].bytes_sent < w[1].bytes_sent));
    let last = events.last().copied().expect("at least one event");
    assert_eq!(last.bytes_sent, last.bytes_total);
    assert_eq!(last.bytes_total, report.compression.bytes_after);
    assert_eq!(last.percent(), 100);
}

#[tokio::test]
async fn test_structured_rejection_passes_through() {
    let server = spawn_ingestion_server().await;
    let orchestrator = TransferOrchestrator::new(client(&server.base_url));

    // Skips client-side validation so the server is the one to refuse.
    let request = TransferRequest::new(
        "visit-1",
        MediaCategory::Avatar,
        vec![CandidateFile::new("face.gif", "image/gif", b"GIF89a".to_vec())],
    );

    let err = orchestrator
        .transfer(request, None, CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        TransferError::Rejected {
            status,
            message,
            errors,
        } => {
            assert_eq!(status, 400);
            assert!(!message.is_empty());
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].field, "avatar");
            assert!(errors[0].error.starts_with("face.gif: invalid type"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_wrong_token_is_rejected() {
    let server = spawn_ingestion_server().await;
    let client = outreach_api_client::ApiClient::new(
        &server.base_url,
        "not-the-token",
        Duration::from_secs(5),
    )
    .unwrap();

    let err = TransferOrchestrator::new(client)
        .transfer(
            TransferRequest::new("visit-1", MediaCategory::Photo, vec![photo("a.jpg", 8)]),
            None,
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, TransferError::Rejected { status: 401, .. }));
}

#[tokio::test]
async fn test_unstructured_error_synthesizes_message() {
    let router = Router::new().route(
        "/api/v0/owners/{owner_id}/media",
        post(|| async { (StatusCode::BAD_GATEWAY, "<html>upstream down</html>") }),
    );
    let base_url = spawn_router(router).await;

    let err = TransferOrchestrator::new(client(&base_url))
        .transfer(
            TransferRequest::new("visit-1", MediaCategory::Photo, vec![photo("a.jpg", 8)]),
            None,
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

    match err {
        TransferError::Network { status, message } => {
            assert_eq!(status, Some(502));
            assert_eq!(message, "Upload failed with status 502 (Bad Gateway)");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_timeout() {
    let base_url = spawn_router(silent_router()).await;
    let timeout = Duration::from_millis(200);

    let err = TransferOrchestrator::new(client(&base_url))
        .with_timeout(timeout)
        .transfer(
            TransferRequest::new("visit-1", MediaCategory::Photo, vec![photo("a.jpg", 8)]),
            None,
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, TransferError::Timeout(t) if t == timeout));
}

#[tokio::test]
async fn test_cancel_before_start_sends_nothing() {
    let base_url = spawn_router(silent_router()).await;
    let cancel = CancellationToken::new();
    cancel.cancel();
    let (tx, rx) = unbounded_channel();

    let outcome = TransferOrchestrator::new(client(&base_url))
        .transfer(
            TransferRequest::new("visit-1", MediaCategory::Photo, vec![photo("a.jpg", 8)]),
            Some(tx),
            cancel,
        )
        .await
        .unwrap();

    assert!(outcome.is_cancelled());
    assert!(drain(rx).await.is_empty());
}

#[tokio::test]
async fn test_cancel_mid_transfer() {
    let base_url = spawn_router(silent_router()).await;
    let orchestrator = TransferOrchestrator::new(client(&base_url)).with_chunk_size(512);
    let cancel = CancellationToken::new();
    let (tx, mut rx) = unbounded_channel();

    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let first = rx.recv().await;
            cancel.cancel();
            // Channel must end once the orchestrator observes cancellation.
            while rx.recv().await.is_some() {}
            first
        })
    };

    let request = TransferRequest::new(
        "visit-1",
        MediaCategory::Photo,
        vec![CandidateFile::new("big.jpg", "image/jpeg", vec![7u8; 256 * 1024])],
    );

    let outcome = tokio::time::timeout(
        Duration::from_secs(10),
        orchestrator.transfer(request, Some(tx), cancel),
    )
    .await
    .expect("cancellation should resolve promptly")
    .unwrap();

    assert!(matches!(outcome, TransferOutcome::Cancelled));

    let first = watcher
        .await
        .unwrap()
        .expect("at least one progress event before cancel");
    assert_eq!(first.bytes_sent, 512);
}
