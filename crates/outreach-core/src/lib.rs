//! Outreach Core Library
//!
//! Domain models, error types, upload policy and configuration shared by the
//! ingestion server, the upload client and the command line tool.

pub mod config;
pub mod error;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::{
    CompressionConfig, PolicyEntry, PolicyError, PolicyTable, RecompressionProfile, ServerConfig,
};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{CandidateFile, MediaCategory, StoredFileReference};
