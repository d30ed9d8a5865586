//! Outreach media processing
//!
//! Client-side stages of the upload pipeline that run before any network call:
//! policy validation of a candidate batch and recompression of accepted images.

pub mod compression;
pub mod image;
pub mod validator;

pub use compression::{
    CompressionOutcome, CompressionProgress, CompressionResult, CompressionStats,
    CompressionWarning, PassThroughReason, Recompressor, WarningKind, CANONICAL_MIME_TYPE,
};
pub use validator::{
    check_file, validate, validate_with_entry, BatchViolation, MediaValidator, RejectedFile,
    ValidationOutcome, Violation,
};
