//! Bearer token authentication for the media routes.

use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use outreach_core::AppError;
use std::sync::Arc;
use subtle::ConstantTimeEq;

#[derive(Clone, Debug)]
pub struct AuthState {
    /// Expected token; when unset any well-formed bearer token is accepted
    pub api_token: Option<String>,
}

fn secure_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    request: Request,
    next: Next,
) -> Response {
    let auth_header = match request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
    {
        Some(h) => h,
        None => {
            return HttpAppError::from(AppError::Unauthorized(
                "Missing authorization header".to_string(),
            ))
            .into_response();
        }
    };

    let Some(token) = auth_header.strip_prefix("Bearer ") else {
        return HttpAppError::from(AppError::Unauthorized(
            "Invalid authorization header format".to_string(),
        ))
        .into_response();
    };

    if token.trim().is_empty() {
        return HttpAppError::from(AppError::Unauthorized("Empty bearer token".to_string()))
            .into_response();
    }

    if let Some(expected) = &auth_state.api_token {
        if !secure_compare(token, expected) {
            tracing::debug!("Rejected request with invalid bearer token");
            return HttpAppError::from(AppError::Unauthorized("Invalid token".to_string()))
                .into_response();
        }
    }

    next.run(request).await
}
