//! Outreach API Library
//!
//! HTTP ingestion server: authoritative re-validation of uploaded media,
//! persistence, deletion and stored file serving.

mod api_doc;
pub mod constants;
mod handlers;
mod middleware;
pub mod services;
pub mod setup;
mod telemetry;
mod utils;

pub mod auth;
pub mod error;
pub mod state;

pub use error::{ErrorResponse, HttpAppError, ValidationErrorResponse};
pub use services::upload::{FieldViolation, GuardRejection, IngestionGuard};
