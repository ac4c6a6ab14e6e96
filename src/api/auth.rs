//! Authentication API handlers

use crate::api::SuccessResponse;
use crate::domain::{LoginInput, RegisterInput};
use crate::error::Result;
use crate::middleware::BearerToken;
use crate::server::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

/// Login with email + password, returning an access/refresh token pair
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> Result<impl IntoResponse> {
    let response = state.auth_service.login(input).await?;
    Ok(Json(SuccessResponse::new(response)))
}

/// Controlled signup: the new account awaits administrator approval
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> Result<impl IntoResponse> {
    let user = state.auth_service.register(input).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(user))))
}

/// Exchange a refresh token (presented as the bearer credential) for a new
/// access token
pub async fn refresh(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<impl IntoResponse> {
    let response = state.auth_service.refresh(&token).await?;
    Ok(Json(SuccessResponse::new(response)))
}

/// Current identity lookup
pub async fn me(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<impl IntoResponse> {
    let user = state.authz.authenticate(&token).await?;
    let user = state.auth_service.with_roles(user).await?;
    Ok(Json(SuccessResponse::new(user)))
}
