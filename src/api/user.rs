//! User administration API handlers

use crate::api::{MessageResponse, PaginationQuery, SuccessResponse};
use crate::domain::{perms, UpdateUserInput, SUPERADMIN_ROLE};
use crate::error::Result;
use crate::middleware::BearerToken;
use crate::policy::Requirement;
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct UserSearchQuery {
    pub search: Option<String>,
}

/// List users (paged, optional name/email search)
pub async fn list_users(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Query(pagination): Query<PaginationQuery>,
    Query(filter): Query<UserSearchQuery>,
) -> Result<impl IntoResponse> {
    state
        .authz
        .authorize(&token, &Requirement::permission(perms::MANAGE_USERS))
        .await?;

    let page = state
        .user_service
        .list(filter.search.as_deref(), pagination.page, pagination.per_page)
        .await?;
    Ok(Json(SuccessResponse::new(page)))
}

/// List users pending approval
pub async fn list_pending_users(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<impl IntoResponse> {
    state
        .authz
        .authorize(&token, &Requirement::permission(perms::APPROVE_USERS))
        .await?;

    let users = state.user_service.pending().await?;
    Ok(Json(SuccessResponse::new(users)))
}

/// Get one user
pub async fn get_user(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state
        .authz
        .authorize(&token, &Requirement::permission(perms::MANAGE_USERS))
        .await?;

    let user = state.user_service.get(id).await?;
    Ok(Json(SuccessResponse::new(user)))
}

/// Update profile, flags, password or role memberships
pub async fn update_user(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Path(id): Path<i64>,
    Json(input): Json<UpdateUserInput>,
) -> Result<impl IntoResponse> {
    state
        .authz
        .authorize(&token, &Requirement::permission(perms::MANAGE_USERS))
        .await?;

    let user = state.user_service.update(id, input).await?;
    Ok(Json(SuccessResponse::new(user)))
}

/// Delete a user (superadmin role required; the superadmin account itself
/// is protected by policy)
pub async fn delete_user(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state
        .authz
        .authorize(&token, &Requirement::role(SUPERADMIN_ROLE))
        .await?;

    state.user_service.delete(id).await?;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

/// Approve a pending user
pub async fn approve_user(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state
        .authz
        .authorize(&token, &Requirement::permission(perms::APPROVE_USERS))
        .await?;

    let user = state.user_service.approve(id).await?;
    Ok(Json(SuccessResponse::new(user)))
}
