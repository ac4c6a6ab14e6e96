//! Search API handlers

use crate::api::SuccessResponse;
use crate::domain::{perms, Lead, SearchQuery, StartSearchInput};
use crate::error::Result;
use crate::middleware::BearerToken;
use crate::policy::Requirement;
use crate::server::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ExecuteResponse {
    pub search_query: SearchQuery,
    pub leads_count: u64,
}

#[derive(Debug, Serialize)]
pub struct SearchDetailResponse {
    pub search_query: SearchQuery,
    pub leads: Vec<Lead>,
}

/// Record a new pending search owned by the caller
pub async fn start_search(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Json(input): Json<StartSearchInput>,
) -> Result<impl IntoResponse> {
    let user = state
        .authz
        .authorize(&token, &Requirement::permission(perms::CREATE_SEARCH))
        .await?;

    let query = state.search_service.start(user.id, input).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(query))))
}

/// Execute a recorded search through the scraper engine. Owner-scoped:
/// only the owner (or superadmin) may trigger it; a second execute while
/// the search is running is rejected.
pub async fn execute_search(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let user = state
        .authz
        .authorize(&token, &Requirement::permission(perms::CREATE_SEARCH))
        .await?;

    let query = state.search_service.find(id).await?;
    state.authz.check_owner(&user, query.user_id).await?;

    let (search_query, leads_count) = state.search_service.execute(id).await?;
    Ok(Json(SuccessResponse::new(ExecuteResponse {
        search_query,
        leads_count,
    })))
}

/// List searches: every user's for superadmin, the caller's otherwise
pub async fn list_searches(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<impl IntoResponse> {
    let user = state
        .authz
        .authorize(&token, &Requirement::permission(perms::VIEW_LEADS))
        .await?;
    let scope = state.authz.scope(&user).await?;

    let searches = state.search_service.list(scope.as_filter()).await?;
    Ok(Json(SuccessResponse::new(searches)))
}

/// Search detail with its leads (owner or superadmin)
pub async fn get_search(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let user = state
        .authz
        .authorize(&token, &Requirement::permission(perms::VIEW_LEADS))
        .await?;

    let (search_query, leads) = state.search_service.detail(id).await?;
    state.authz.check_owner(&user, search_query.user_id).await?;

    Ok(Json(SuccessResponse::new(SearchDetailResponse {
        search_query,
        leads,
    })))
}
