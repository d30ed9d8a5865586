//! Outreach CLI: validate, upload and delete media against the ingestion API.
//!
//! Set OUTREACH_API_URL and OUTREACH_API_TOKEN. Policy and recompression limits are
//! read from the same environment variables the server uses.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use outreach_api_client::files::load_candidates;
use outreach_api_client::pipeline::{PipelineError, PipelineProgress};
use outreach_api_client::{
    ApiClient, BulkDeleteCoordinator, ClientConfig, TransferOrchestrator, TransferOutcome,
    UploadPipeline,
};
use outreach_cli::{
    init_tracing, load_references, print_json, rejection_lines, validation_report,
};
use outreach_core::{CompressionConfig, MediaCategory, PolicyTable};
use outreach_processing::{validate, Recompressor};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::unbounded_channel;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "outreach", about = "Outreach media upload CLI")]
struct Cli {
    /// Debug logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check files against the upload policy without sending anything
    Validate {
        /// photo, video, document or avatar
        #[arg(long)]
        category: MediaCategory,
        files: Vec<PathBuf>,
    },
    /// Validate, recompress and upload files for one owner (Ctrl+C cancels)
    Upload {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        category: MediaCategory,
        files: Vec<PathBuf>,
    },
    /// Delete stored files listed in a JSON file (array or `upload` output)
    Delete {
        #[arg(long)]
        owner: String,
        references: PathBuf,
        /// Deletes in flight; defaults to DELETE_CONCURRENCY or 1
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Print the effective upload policy
    Policy,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let policy = Arc::new(PolicyTable::from_env().context("Invalid upload policy")?);

    match cli.command {
        Commands::Validate { category, files } => {
            let files = load_candidates(&files[..]).await?;
            let outcome = validate(&files, category, &policy)?;
            print_json(&validation_report(&outcome))?;
        }
        Commands::Upload {
            owner,
            category,
            files,
        } => {
            let config = ClientConfig::from_env()?;
            config.validate()?;
            upload(&config, policy, &owner, category, files).await?;
        }
        Commands::Delete {
            owner,
            references,
            concurrency,
        } => {
            let config = ClientConfig::from_env()?;
            config.validate()?;
            let references = load_references(&references)?;
            tracing::debug!(count = references.len(), owner_id = %owner, "Loaded file references");
            let client = ApiClient::from_config(&config)?;
            let coordinator = BulkDeleteCoordinator::new(Arc::new(client))
                .with_concurrency(concurrency.unwrap_or(config.delete_concurrency));

            let (tx, mut rx) = unbounded_channel::<outreach_api_client::BulkDeleteProgress>();
            let printer = tokio::spawn(async move {
                while let Some(p) = rx.recv().await {
                    eprintln!("Deleting {}/{}", p.completed, p.total);
                }
            });
            let outcome = coordinator.bulk_delete(&owner, references, Some(&tx)).await;
            drop(tx);
            printer.await.ok();

            print_json(&json!({
                "deleted": outcome.succeeded,
                "failed": outcome.failed.iter().map(|f| json!({
                    "path": f.reference.path,
                    "error": f.error.to_string(),
                })).collect::<Vec<_>>(),
            }))?;
            eprintln!("{}", outcome.summary());
        }
        Commands::Policy => {
            print_json(&policy.entries().collect::<Vec<_>>())?;
        }
    }

    Ok(())
}

async fn upload(
    config: &ClientConfig,
    policy: Arc<PolicyTable>,
    owner: &str,
    category: MediaCategory,
    paths: Vec<PathBuf>,
) -> Result<()> {
    let files = load_candidates(&paths[..]).await?;
    let client = ApiClient::from_config(config)?;
    let recompressor = Recompressor::new(Arc::new(CompressionConfig::from_env()?));
    let pipeline = UploadPipeline::new(policy, recompressor, TransferOrchestrator::new(client))
        .with_compression_concurrency(config.compression_concurrency);

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let (compression_tx, mut compression_rx) = unbounded_channel::<outreach_processing::CompressionProgress>();
    let (transfer_tx, mut transfer_rx) = unbounded_channel::<outreach_api_client::TransferProgressEvent>();
    let printer = tokio::spawn(async move {
        while let Some(p) = compression_rx.recv().await {
            eprintln!("Compressing {}/{}", p.completed, p.total);
        }
        let mut last = None;
        while let Some(p) = transfer_rx.recv().await {
            let percent = p.percent();
            if last != Some(percent) {
                eprintln!("Uploading {}%", percent);
                last = Some(percent);
            }
        }
    });

    let progress = PipelineProgress {
        compression: Some(compression_tx),
        transfer: Some(transfer_tx),
    };
    let result = pipeline.run(owner, category, files, progress, cancel).await;
    printer.await.ok();

    let report = match result {
        Ok(report) => report,
        Err(PipelineError::NothingToUpload(rejected)) => {
            eprintln!("{}", rejection_lines(&rejected));
            anyhow::bail!("No file passed validation");
        }
        Err(PipelineError::BatchRejected {
            violations,
            rejected,
        }) => {
            for violation in &violations {
                eprintln!("Batch: {}", violation);
            }
            if !rejected.is_empty() {
                eprintln!("{}", rejection_lines(&rejected));
            }
            anyhow::bail!("Batch rejected before upload ({} violation(s))", violations.len());
        }
        Err(e) => return Err(e.into()),
    };

    if !report.rejected.is_empty() {
        eprintln!("Skipped:\n{}", rejection_lines(&report.rejected));
    }
    for warning in &report.warnings {
        eprintln!("Sent {} unchanged: {}", warning.file_name, warning.message);
    }

    match report.outcome {
        TransferOutcome::Completed(receipt) => {
            print_json(&json!({
                "files": receipt.files,
                "warnings": receipt.warnings,
                "compression": report.compression,
            }))?;
        }
        TransferOutcome::Cancelled => {
            eprintln!("Upload cancelled");
        }
    }
    Ok(())
}
