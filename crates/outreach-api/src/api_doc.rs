//! OpenAPI documentation.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use crate::services::upload::FieldViolation;
use outreach_core::{MediaCategory, StoredFileReference};

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Outreach Media Ingestion API",
        version = "0.1.0",
        description = "Authoritative ingestion of media uploaded by field clients. Files are grouped by category field name and admitted all-or-nothing. Versioned routes live under /api/v0/."
    ),
    paths(
        handlers::media_upload::upload_media,
        handlers::media_delete::delete_media,
        handlers::public_file::get_public_file,
        handlers::health::health_check,
    ),
    components(
        schemas(
            MediaCategory,
            StoredFileReference,
            FieldViolation,
            handlers::media_upload::UploadResponse,
            handlers::media_upload::UploadData,
            handlers::media_delete::DeleteResponse,
            handlers::health::HealthResponse,
            error::ErrorResponse,
            error::ValidationErrorResponse,
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "media", description = "Upload and delete media for an owner"),
        (name = "files", description = "Stored file retrieval"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
