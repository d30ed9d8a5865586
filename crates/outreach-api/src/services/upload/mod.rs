//! Upload ingestion: authoritative validation and persistence of received files.

pub mod guard;
pub mod service;

pub use guard::{
    AdmittedBatch, AdmittedUpload, FieldViolation, GuardRejection, IncomingField, IncomingUpload,
    IngestionGuard, REQUEST_FIELD,
};
pub use service::{UploadReceipt, UploadService};
