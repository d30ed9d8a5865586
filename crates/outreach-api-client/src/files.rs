//! Loading local files as upload candidates.

use anyhow::{Context, Result};
use outreach_core::validation::mime_for_filename;
use outreach_core::CandidateFile;
use std::path::{Component, Path};

/// Read one file; the mime type is guessed from its extension.
pub async fn load_candidate(path: &Path) -> Result<CandidateFile> {
    if path.components().any(|c| c == Component::ParentDir) {
        return Err(anyhow::anyhow!("Invalid input: {}", path.display()));
    }

    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();

    Ok(CandidateFile::new(name.clone(), mime_for_filename(&name), data))
}

pub async fn load_candidates<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<CandidateFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(load_candidate(path.as_ref()).await?);
    }
    Ok(files)
}
