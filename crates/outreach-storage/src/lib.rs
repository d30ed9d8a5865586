//! Outreach Storage Library
//!
//! Persistence collaborator for accepted uploads: the `Storage` trait and a local
//! filesystem implementation.
//!
//! # Storage key format
//!
//! Keys are owner-scoped: `{category}/{owner_id}/{uuid}-{filename}`. Keys must not
//! contain `..` or a leading `/`. Key generation is centralized in the `keys` module.

pub mod factory;
pub mod keys;
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use local::LocalStorage;
pub use traits::{Storage, StorageError, StorageResult};
