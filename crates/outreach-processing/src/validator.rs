use outreach_core::validation::{normalize_mime_type, MAX_FILENAME_LENGTH};
use outreach_core::{CandidateFile, MediaCategory, PolicyEntry, PolicyError, PolicyTable};
use std::fmt;
use std::sync::Arc;

/// A rule broken by one file. Every rule is evaluated; a file may carry several.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    ExceedsMaximumSize { size: u64, max: u64 },
    InvalidType { mime_type: String },
    InvalidName { name: String },
}

impl Violation {
    /// Stable, user-facing reason string.
    pub fn reason(&self) -> &'static str {
        match self {
            Violation::ExceedsMaximumSize { .. } => "exceeds maximum size",
            Violation::InvalidType { .. } => "invalid type",
            Violation::InvalidName { .. } => "invalid name",
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::ExceedsMaximumSize { size, max } => {
                write!(f, "{} ({} bytes, max {} bytes)", self.reason(), size, max)
            }
            Violation::InvalidType { mime_type } => write!(f, "{} ({})", self.reason(), mime_type),
            Violation::InvalidName { .. } => write!(
                f,
                "{} (must be 1-{} characters)",
                self.reason(),
                MAX_FILENAME_LENGTH
            ),
        }
    }
}

/// A rule broken by the batch as a whole rather than by any single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchViolation {
    TooManyFiles { count: usize, max: usize },
    /// Fatal: the whole batch must be rejected, never partitioned.
    AggregateCeilingExceeded { total: u64, ceiling: u64 },
}

impl BatchViolation {
    pub fn is_fatal(&self) -> bool {
        matches!(self, BatchViolation::AggregateCeilingExceeded { .. })
    }
}

impl fmt::Display for BatchViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchViolation::TooManyFiles { count, max } => {
                write!(f, "too many files ({} submitted, max {})", count, max)
            }
            BatchViolation::AggregateCeilingExceeded { total, ceiling } => write!(
                f,
                "total size exceeds batch limit ({} bytes, max {} bytes)",
                total, ceiling
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedFile {
    pub file: CandidateFile,
    pub reasons: Vec<Violation>,
}

/// Result of validating one batch. Produced fresh per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub category: MediaCategory,
    pub accepted: Vec<CandidateFile>,
    pub rejected: Vec<RejectedFile>,
    pub aggregate_accepted_bytes: u64,
    pub batch_violations: Vec<BatchViolation>,
}

impl ValidationOutcome {
    /// True when the aggregate ceiling was exceeded and nothing may proceed.
    pub fn is_batch_fatal(&self) -> bool {
        self.batch_violations.iter().any(BatchViolation::is_fatal)
    }

    /// True when every file passed and no batch-level rule was broken.
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty() && self.batch_violations.is_empty()
    }

    /// Files that may be sent on. Any batch-level violation blocks the batch, since the
    /// ingestion server rejects the same request.
    pub fn into_admissible(self) -> Result<Vec<CandidateFile>, Vec<BatchViolation>> {
        if self.batch_violations.is_empty() {
            Ok(self.accepted)
        } else {
            Err(self.batch_violations)
        }
    }
}

/// Rules violated by one file, in rule order.
pub fn check_file(file: &CandidateFile, policy: &PolicyEntry) -> Vec<Violation> {
    let mut reasons = Vec::new();

    if file.size_bytes > policy.max_size_bytes {
        reasons.push(Violation::ExceedsMaximumSize {
            size: file.size_bytes,
            max: policy.max_size_bytes,
        });
    }

    let mime_type = normalize_mime_type(&file.mime_type);
    if !policy.allows_mime_type(&mime_type) {
        reasons.push(Violation::InvalidType { mime_type });
    }

    let name_len = file.name.trim().chars().count();
    if name_len == 0 || file.name.chars().count() > MAX_FILENAME_LENGTH {
        reasons.push(Violation::InvalidName {
            name: file.name.clone(),
        });
    }

    reasons
}

/// Validate a batch against one policy entry.
pub fn validate_with_entry(files: &[CandidateFile], policy: &PolicyEntry) -> ValidationOutcome {
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();

    for file in files {
        let reasons = check_file(file, policy);
        if reasons.is_empty() {
            accepted.push(file.clone());
        } else {
            rejected.push(RejectedFile {
                file: file.clone(),
                reasons,
            });
        }
    }

    let aggregate_accepted_bytes: u64 = accepted.iter().map(|f| f.size_bytes).sum();

    let mut batch_violations = Vec::new();
    if files.len() > policy.max_count {
        batch_violations.push(BatchViolation::TooManyFiles {
            count: files.len(),
            max: policy.max_count,
        });
    }
    if let Some(ceiling) = policy.aggregate_ceiling_bytes {
        if aggregate_accepted_bytes > ceiling {
            batch_violations.push(BatchViolation::AggregateCeilingExceeded {
                total: aggregate_accepted_bytes,
                ceiling,
            });
        }
    }

    ValidationOutcome {
        category: policy.category,
        accepted,
        rejected,
        aggregate_accepted_bytes,
        batch_violations,
    }
}

/// Validate a batch of one category against the policy table. Pure.
pub fn validate(
    files: &[CandidateFile],
    category: MediaCategory,
    policy: &PolicyTable,
) -> Result<ValidationOutcome, PolicyError> {
    let entry = policy.lookup(category)?;
    Ok(validate_with_entry(files, entry))
}

/// Media file validator bound to a policy table.
#[derive(Debug, Clone)]
pub struct MediaValidator {
    policy: Arc<PolicyTable>,
}

impl MediaValidator {
    pub fn new(policy: Arc<PolicyTable>) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PolicyTable {
        &self.policy
    }

    pub fn validate(
        &self,
        files: &[CandidateFile],
        category: MediaCategory,
    ) -> Result<ValidationOutcome, PolicyError> {
        validate(files, category, &self.policy)
    }
}
