//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. `AppError` values render as
//! an [`ErrorResponse`]; ingestion guard rejections render as a [`ValidationErrorResponse`]
//! listing every violation.

use crate::services::upload::{FieldViolation, GuardRejection};
use axum::{
    extract::rejection::JsonRejection,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use outreach_core::{AppError, ErrorMetadata, LogLevel};
use serde::{de::DeserializeOwned, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

/// Body of a 400 produced by the ingestion guard.
#[derive(Debug, Serialize, ToSchema)]
pub struct ValidationErrorResponse {
    /// Always `false`
    pub success: bool,
    pub message: String,
    pub errors: Vec<FieldViolation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl From<GuardRejection> for ValidationErrorResponse {
    fn from(rejection: GuardRejection) -> Self {
        Self {
            success: false,
            message: rejection.message,
            errors: rejection.violations,
            warnings: rejection.warnings,
        }
    }
}

/// Wrapper type for AppError to implement IntoResponse
/// (orphan rules: both the trait and AppError are foreign to this crate)
#[derive(Debug)]
pub enum HttpAppError {
    App(AppError),
    Rejected(GuardRejection),
}

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError::App(err)
    }
}

impl From<GuardRejection> for HttpAppError {
    fn from(rejection: GuardRejection) -> Self {
        HttpAppError::Rejected(rejection)
    }
}

impl From<outreach_storage::StorageError> for HttpAppError {
    fn from(err: outreach_storage::StorageError) -> Self {
        HttpAppError::App(err.into())
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError::App(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

/// Convert JSON body deserialization failures into a 400 with our ErrorResponse format.
impl From<JsonRejection> for HttpAppError {
    fn from(rejection: JsonRejection) -> Self {
        HttpAppError::App(AppError::InvalidInput(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

/// JSON body extractor that returns our ErrorResponse format (400 + JSON) on deserialization failure.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state)
            .await
            .map_err(HttpAppError::from)?;
        Ok(ValidatedJson(inner))
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

fn app_error_response(app_error: &AppError) -> Response {
    let status = StatusCode::from_u16(app_error.http_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    log_error(app_error);

    // Details are hidden in production and for sensitive errors.
    let show_details = !is_production_env() && !app_error.is_sensitive();
    let body = ErrorResponse {
        success: false,
        message: app_error.client_message(),
        details: show_details.then(|| app_error.detailed_message()),
        error_type: show_details.then(|| app_error.error_type().to_string()),
        code: app_error.error_code().to_string(),
        recoverable: app_error.is_recoverable(),
        suggested_action: app_error.suggested_action().map(String::from),
    };

    (status, Json(body)).into_response()
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        match self {
            HttpAppError::App(app_error) => app_error_response(&app_error),
            HttpAppError::Rejected(rejection) => {
                tracing::debug!(
                    violation_count = rejection.violations.len(),
                    "Returning itemized validation errors"
                );
                (
                    StatusCode::BAD_REQUEST,
                    Json(ValidationErrorResponse::from(rejection)),
                )
                    .into_response()
            }
        }
    }
}
