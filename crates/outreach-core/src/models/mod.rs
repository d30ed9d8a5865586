//! Domain models shared by the client pipeline and the ingestion server.

pub mod media;

pub use media::{CandidateFile, MediaCategory, StoredFileReference};
