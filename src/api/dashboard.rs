//! Dashboard API handlers

use crate::api::SuccessResponse;
use crate::domain::perms;
use crate::error::Result;
use crate::middleware::BearerToken;
use crate::policy::Requirement;
use crate::server::AppState;
use axum::{extract::State, response::IntoResponse, Json};

/// Aggregated stats within the caller's scope
pub async fn stats(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<impl IntoResponse> {
    let user = state
        .authz
        .authorize(&token, &Requirement::permission(perms::VIEW_DASHBOARD))
        .await?;
    let scope = state.authz.scope(&user).await?;

    let stats = state.dashboard_service.stats(scope.as_filter()).await?;
    Ok(Json(SuccessResponse::new(stats)))
}
