//! Bearer credential extraction
//!
//! The extractor only peels the `Authorization` header; every semantic
//! check (signature, expiry, user state, capabilities) belongs to the
//! authorization engine so each route declares its requirement explicitly.

use crate::error::AppError;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

/// Raw bearer token taken from the `Authorization` header
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

/// Extract and validate the Bearer scheme from request headers
fn extract_bearer_token(headers: &axum::http::HeaderMap) -> Result<&str, AppError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthenticated("missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Unauthenticated("invalid authorization header".to_string()))?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| {
            AppError::Unauthenticated("authorization header must use Bearer scheme".to_string())
        })
}

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)?;
        Ok(BearerToken(token.to_string()))
    }
}
