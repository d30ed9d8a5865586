//! Transfer orchestrator
//!
//! Streams one batch as a single multipart POST. Each file becomes a part named with
//! the category's field name. Progress is byte-level: every chunk handed to the
//! transport advances `bytes_sent` against the total payload size.

use crate::progress::{ProgressReporter, TransferProgressEvent};
use crate::ApiClient;
use bytes::Bytes;
use futures::{stream, Stream, StreamExt};
use outreach_core::{CandidateFile, MediaCategory, StoredFileReference};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, StatusCode};
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

const CHUNK_SIZE: usize = 64 * 1024;

/// One batch bound for one owner.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub owner_id: String,
    pub category: MediaCategory,
    pub files: Vec<CandidateFile>,
}

impl TransferRequest {
    pub fn new(owner_id: impl Into<String>, category: MediaCategory, files: Vec<CandidateFile>) -> Self {
        Self {
            owner_id: owner_id.into(),
            category,
            files,
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.data.len() as u64).sum()
    }
}

/// Server acknowledgement of an accepted batch
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransferReceipt {
    pub files: Vec<StoredFileReference>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum TransferOutcome {
    Completed(TransferReceipt),
    /// Cancelled by the caller; not an error
    Cancelled,
}

impl TransferOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TransferOutcome::Cancelled)
    }
}

/// One itemized violation reported by the server
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub error: String,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum TransferError {
    /// Structured error body, surfaced as sent by the server
    #[error("{message}")]
    Rejected {
        status: u16,
        message: String,
        errors: Vec<FieldError>,
    },

    #[error("{message}")]
    Network {
        status: Option<u16>,
        message: String,
    },

    #[error("Transfer timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid transfer request: {0}")]
    InvalidRequest(String),
}

#[derive(Deserialize)]
struct SuccessEnvelope {
    data: TransferReceipt,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    message: Option<String>,
    error: Option<String>,
    #[serde(default)]
    errors: Vec<FieldError>,
}

/// Parse a non-success response body. Structured bodies are passed through;
/// anything else gets a message synthesized from the status code.
pub fn error_from_response(status: u16, body: &[u8]) -> TransferError {
    match serde_json::from_slice::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope {
            message: Some(message),
            errors,
            ..
        })
        | Ok(ErrorEnvelope {
            error: Some(message),
            errors,
            ..
        }) => TransferError::Rejected {
            status,
            message,
            errors,
        },
        _ => TransferError::Network {
            status: Some(status),
            message: status_message(status),
        },
    }
}

fn status_message(status: u16) -> String {
    let reason = StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason());
    match reason {
        Some(reason) => format!("Upload failed with status {} ({})", status, reason),
        None => format!("Upload failed with status {}", status),
    }
}

fn network_error(e: reqwest::Error) -> TransferError {
    TransferError::Network {
        status: e.status().map(|s| s.as_u16()),
        message: format!("Network error: {}", e),
    }
}

#[derive(Clone, Debug)]
pub struct TransferOrchestrator {
    client: ApiClient,
    timeout: Duration,
    chunk_size: usize,
}

impl TransferOrchestrator {
    /// Uses the client's timeout.
    pub fn new(client: ApiClient) -> Self {
        let timeout = client.timeout();
        Self {
            client,
            timeout,
            chunk_size: CHUNK_SIZE,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Stream the batch. Resolves `Ok(Cancelled)` as soon as `cancel` fires; after
    /// that the progress channel is closed and the transfer never reports success.
    #[tracing::instrument(
        skip(self, request, progress, cancel),
        fields(
            owner_id = %request.owner_id,
            category = %request.category,
            file_count = request.files.len(),
            total_bytes = request.total_bytes()
        )
    )]
    pub async fn transfer(
        &self,
        request: TransferRequest,
        progress: Option<UnboundedSender<TransferProgressEvent>>,
        cancel: CancellationToken,
    ) -> Result<TransferOutcome, TransferError> {
        let reporter = Arc::new(ProgressReporter::new(progress, cancel.clone()));

        if cancel.is_cancelled() {
            reporter.close();
            return Ok(TransferOutcome::Cancelled);
        }

        let total = request.total_bytes();
        let sent = Arc::new(AtomicU64::new(0));
        let field_name = request.category.field_name();

        let mut form = Form::new();
        for file in &request.files {
            let body = Body::wrap_stream(self.chunk_stream(
                file.data.clone(),
                total,
                sent.clone(),
                reporter.clone(),
                cancel.clone(),
            ));
            let part = Part::stream_with_length(body, file.data.len() as u64)
                .file_name(file.name.clone())
                .mime_str(&file.mime_type)
                .map_err(|e| {
                    TransferError::InvalidRequest(format!(
                        "Invalid mime type '{}' for {}: {}",
                        file.mime_type, file.name, e
                    ))
                })?;
            form = form.part(field_name, part);
        }

        let start = Instant::now();
        let send = self
            .client
            .apply_auth(self.client.client().post(self.client.media_url(&request.owner_id)))
            .multipart(form)
            .send();

        let work = async {
            let response = send.await.map_err(network_error)?;
            let status = response.status();
            let body = response.bytes().await.map_err(network_error)?;

            if !status.is_success() {
                return Err(error_from_response(status.as_u16(), &body));
            }

            serde_json::from_slice::<SuccessEnvelope>(&body)
                .map(|envelope| envelope.data)
                .map_err(|e| TransferError::Network {
                    status: Some(status.as_u16()),
                    message: format!("Unexpected response body: {}", e),
                })
        };

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                reporter.close();
                tracing::info!(
                    bytes_sent = sent.load(Ordering::SeqCst),
                    "Transfer cancelled"
                );
                return Ok(TransferOutcome::Cancelled);
            }
            result = tokio::time::timeout(self.timeout, work) => result,
        };

        reporter.close();

        match result {
            Err(_) => {
                tracing::warn!(timeout_secs = self.timeout.as_secs_f64(), "Transfer timed out");
                Err(TransferError::Timeout(self.timeout))
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Transfer failed");
                Err(e)
            }
            Ok(Ok(receipt)) => {
                tracing::info!(
                    stored_count = receipt.files.len(),
                    warning_count = receipt.warnings.len(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Transfer completed"
                );
                Ok(TransferOutcome::Completed(receipt))
            }
        }
    }

    fn chunk_stream(
        &self,
        data: Bytes,
        total: u64,
        sent: Arc<AtomicU64>,
        reporter: Arc<ProgressReporter<TransferProgressEvent>>,
        cancel: CancellationToken,
    ) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
        let chunks: Vec<Bytes> = (0..data.len())
            .step_by(self.chunk_size)
            .map(|start| data.slice(start..(start + self.chunk_size).min(data.len())))
            .collect();

        stream::iter(chunks).map(move |chunk| {
            if cancel.is_cancelled() {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::Interrupted,
                    "transfer cancelled",
                ));
            }
            let len = chunk.len() as u64;
            let bytes_sent = sent.fetch_add(len, Ordering::SeqCst) + len;
            reporter.emit(TransferProgressEvent {
                bytes_sent,
                bytes_total: total,
            });
            Ok(chunk)
        })
    }
}
