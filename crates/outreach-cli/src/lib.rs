//! Shared helpers for the `outreach` command line tool.

use anyhow::{Context, Result};
use outreach_core::StoredFileReference;
use outreach_processing::{RejectedFile, ValidationOutcome};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;

pub fn print_json(value: &impl Serialize) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

/// JSON view of a validation outcome; file contents are left out.
pub fn validation_report(outcome: &ValidationOutcome) -> Value {
    json!({
        "category": outcome.category,
        "accepted": outcome.accepted.iter().map(|f| json!({
            "name": f.name,
            "mime_type": f.mime_type,
            "size_bytes": f.size_bytes,
        })).collect::<Vec<_>>(),
        "rejected": outcome.rejected.iter().map(|r| json!({
            "name": r.file.name,
            "reasons": r.reasons.iter().map(ToString::to_string).collect::<Vec<_>>(),
        })).collect::<Vec<_>>(),
        "aggregate_accepted_bytes": outcome.aggregate_accepted_bytes,
        "batch_violations": outcome.batch_violations.iter().map(ToString::to_string).collect::<Vec<_>>(),
    })
}

/// One line per rejected file: `name: reason, reason`.
pub fn rejection_lines(rejected: &[RejectedFile]) -> String {
    rejected
        .iter()
        .map(|r| {
            let reasons: Vec<String> = r.reasons.iter().map(ToString::to_string).collect();
            format!("{}: {}", r.file.name, reasons.join(", "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ReferenceFile {
    List(Vec<StoredFileReference>),
    Receipt { files: Vec<StoredFileReference> },
}

/// Read references from a JSON file: either a bare array or the output of `upload`.
pub fn load_references(path: &Path) -> Result<Vec<StoredFileReference>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let parsed: ReferenceFile = serde_json::from_str(&raw)
        .with_context(|| format!("{} holds no file references", path.display()))?;
    Ok(match parsed {
        ReferenceFile::List(files) | ReferenceFile::Receipt { files } => files,
    })
}

/// Initialize tracing for the CLI. Logs go to stderr so JSON output stays clean.
pub fn init_tracing(verbose: bool) {
    let default = if verbose {
        "outreach_api_client=debug,outreach_processing=debug,outreach_cli=debug,info"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .init();
}
