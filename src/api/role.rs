//! Role and permission API handlers

use crate::api::{MessageResponse, SuccessResponse};
use crate::domain::{perms, CreateRoleInput, UpdateRoleInput};
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

/// List roles with their permission grants
pub async fn list_roles(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<impl IntoResponse> {
    state
        .authz
        .authorize(&token, &Requirement::permission(perms::MANAGE_ROLES))
        .await?;

    let roles = state.rbac_service.list_roles().await?;
    Ok(Json(SuccessResponse::new(roles)))
}

/// List the permission vocabulary
pub async fn list_permissions(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<impl IntoResponse> {
    state
        .authz
        .authorize(&token, &Requirement::permission(perms::MANAGE_ROLES))
        .await?;

    let permissions = state.rbac_service.list_permissions().await?;
    Ok(Json(SuccessResponse::new(permissions)))
}

/// Get one role
pub async fn get_role(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state
        .authz
        .authorize(&token, &Requirement::permission(perms::MANAGE_ROLES))
        .await?;

    let role = state.rbac_service.get_role(id).await?;
    Ok(Json(SuccessResponse::new(role)))
}

/// Create a role
pub async fn create_role(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Json(input): Json<CreateRoleInput>,
) -> Result<impl IntoResponse> {
    state
        .authz
        .authorize(&token, &Requirement::permission(perms::MANAGE_ROLES))
        .await?;

    let role = state.rbac_service.create_role(input).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(role))))
}

/// Update a role (the superadmin role cannot be renamed)
pub async fn update_role(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Path(id): Path<i64>,
    Json(input): Json<UpdateRoleInput>,
) -> Result<impl IntoResponse> {
    state
        .authz
        .authorize(&token, &Requirement::permission(perms::MANAGE_ROLES))
        .await?;

    let role = state.rbac_service.update_role(id, input).await?;
    Ok(Json(SuccessResponse::new(role)))
}

/// Delete a role (the superadmin role is protected by policy)
pub async fn delete_role(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state
        .authz
        .authorize(&token, &Requirement::permission(perms::MANAGE_ROLES))
        .await?;

    state.rbac_service.delete_role(id).await?;
    Ok(Json(MessageResponse::new("Role deleted successfully")))
}
