//! Ingestion guard
//!
//! Authoritative, server-side re-validation of every received file. Client-side checks
//! are advisory; this guard runs the same rules against the bytes actually received
//! and admits a request all-or-nothing.

use outreach_core::{CandidateFile, MediaCategory, PolicyTable};
use outreach_processing::validate_with_entry;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

/// Field name used for violations that concern the request as a whole.
pub const REQUEST_FIELD: &str = "request";

/// Files received under one multipart field name.
#[derive(Debug, Clone, Default)]
pub struct IncomingField {
    pub name: String,
    pub files: Vec<CandidateFile>,
}

/// A received upload request, grouped by field name in arrival order.
#[derive(Debug, Clone, Default)]
pub struct IncomingUpload {
    pub fields: Vec<IncomingField>,
}

impl IncomingUpload {
    pub fn push(&mut self, field: &str, file: CandidateFile) {
        match self.fields.iter_mut().find(|f| f.name == field) {
            Some(existing) => existing.files.push(file),
            None => self.fields.push(IncomingField {
                name: field.to_string(),
                files: vec![file],
            }),
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.fields
            .iter()
            .flat_map(|f| f.files.iter())
            .map(|f| f.data.len() as u64)
            .sum()
    }

    pub fn file_count(&self) -> usize {
        self.fields.iter().map(|f| f.files.len()).sum()
    }
}

/// One policy violation, attributed to the field it was found in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldViolation {
    pub field: String,
    pub error: String,
}

impl FieldViolation {
    fn new(field: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            error: error.into(),
        }
    }
}

/// Files of one category that passed every rule.
#[derive(Debug, Clone)]
pub struct AdmittedBatch {
    pub category: MediaCategory,
    pub files: Vec<CandidateFile>,
}

#[derive(Debug, Clone, Default)]
pub struct AdmittedUpload {
    pub batches: Vec<AdmittedBatch>,
    /// Non-fatal findings such as unrecognized fields
    pub warnings: Vec<String>,
}

impl AdmittedUpload {
    pub fn file_count(&self) -> usize {
        self.batches.iter().map(|b| b.files.len()).sum()
    }
}

/// The whole request is rejected; `violations` lists everything found.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct GuardRejection {
    pub message: String,
    pub violations: Vec<FieldViolation>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct IngestionGuard {
    policy: Arc<PolicyTable>,
    max_payload_bytes: Option<u64>,
}

impl IngestionGuard {
    pub fn new(policy: Arc<PolicyTable>, max_payload_bytes: Option<u64>) -> Self {
        Self {
            policy,
            max_payload_bytes,
        }
    }

    pub fn policy(&self) -> &PolicyTable {
        &self.policy
    }

    /// Validate a whole request. Stateless and single-pass; nothing is persisted here.
    pub fn enforce(&self, upload: IncomingUpload) -> Result<AdmittedUpload, GuardRejection> {
        let mut violations = Vec::new();
        let mut warnings = Vec::new();
        let mut batches = Vec::new();

        if let Some(gate) = self.max_payload_bytes {
            let total = upload.total_bytes();
            if total > gate {
                violations.push(FieldViolation::new(
                    REQUEST_FIELD,
                    format!(
                        "payload exceeds maximum total size ({} bytes, max {} bytes)",
                        total, gate
                    ),
                ));
            }
        }

        for field in upload.fields {
            let Some(entry) = self.policy.entry_for_field(&field.name) else {
                tracing::warn!(
                    field = %field.name,
                    file_count = field.files.len(),
                    "Ignoring unrecognized upload field"
                );
                warnings.push(format!(
                    "Ignored unrecognized field '{}' ({} file(s))",
                    field.name,
                    field.files.len()
                ));
                continue;
            };

            // Sizes are taken from the received bytes, never from client claims.
            let files: Vec<CandidateFile> = field
                .files
                .into_iter()
                .map(|mut file| {
                    file.size_bytes = file.data.len() as u64;
                    file
                })
                .collect();

            let outcome = validate_with_entry(&files, entry);

            for rejected in &outcome.rejected {
                let label = if rejected.file.name.trim().is_empty() {
                    "(unnamed file)"
                } else {
                    rejected.file.name.as_str()
                };
                for reason in &rejected.reasons {
                    violations.push(FieldViolation::new(
                        &field.name,
                        format!("{}: {}", label, reason),
                    ));
                }
            }
            for batch in &outcome.batch_violations {
                violations.push(FieldViolation::new(&field.name, batch.to_string()));
            }

            batches.push(AdmittedBatch {
                category: entry.category,
                files: outcome.accepted,
            });
        }

        let admitted_files: usize = batches.iter().map(|b| b.files.len()).sum();
        if violations.is_empty() && admitted_files == 0 {
            violations.push(FieldViolation::new(REQUEST_FIELD, "no files provided"));
        }

        if !violations.is_empty() {
            tracing::info!(
                violation_count = violations.len(),
                warning_count = warnings.len(),
                "Upload rejected by ingestion guard"
            );
            return Err(GuardRejection {
                message: format!(
                    "Upload rejected: {} policy violation(s)",
                    violations.len()
                ),
                violations,
                warnings,
            });
        }

        batches.retain(|b| !b.files.is_empty());
        Ok(AdmittedUpload { batches, warnings })
    }
}
