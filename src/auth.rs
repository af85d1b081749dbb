//! # Authentication
//!
//! Shared-secret bearer authentication for the sync trigger endpoints.
//! The secret is compared in constant time.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::config::AppConfig;
use crate::error::{ApiError, unauthorized};

/// Marker type for authenticated sync-trigger requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncAuth;

/// Middleware validating the `Authorization: Bearer <shared-secret>` header
pub async fn sync_auth_middleware(
    State(config): State<Arc<AppConfig>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers())?;
    validate_secret(&config, token)?;

    let mut request = request;
    request.extensions_mut().insert(SyncAuth);

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(AUTHORIZATION)
        .ok_or_else(|| unauthorized(Some("Missing Authorization header")))
        .and_then(|value| {
            value
                .to_str()
                .map_err(|_| unauthorized(Some("Invalid Authorization header")))
        })
        .and_then(|header| {
            header
                .strip_prefix("Bearer ")
                .ok_or_else(|| unauthorized(Some("Authorization header must use Bearer scheme")))
        })
}

impl<S> FromRequestParts<S> for SyncAuth
where
    S: Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SyncAuth>()
            .copied()
            .ok_or_else(|| unauthorized(Some("Sync authentication required")))
    }
}

fn validate_secret(config: &AppConfig, token: &str) -> Result<(), ApiError> {
    let is_valid = config
        .sync_secret
        .as_deref()
        .is_some_and(|configured| {
            ConstantTimeEq::ct_eq(token.as_bytes(), configured.as_bytes()).into()
        });

    if is_valid {
        Ok(())
    } else {
        Err(unauthorized(Some("Invalid bearer token")))
    }
}
