//! RBAC (Role-Based Access Control) domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// The distinguished role: always exists, holds the full permission set at
/// bootstrap, and may never be renamed or deleted.
pub const SUPERADMIN_ROLE: &str = "superadmin";

/// Capability tokens used by route requirements
pub mod perms {
    pub const VIEW_DASHBOARD: &str = "view_dashboard";
    pub const CREATE_SEARCH: &str = "create_search";
    pub const VIEW_LEADS: &str = "view_leads";
    pub const EXPORT_LEADS: &str = "export_leads";
    pub const MANAGE_USERS: &str = "manage_users";
    pub const MANAGE_ROLES: &str = "manage_roles";
    pub const APPROVE_USERS: &str = "approve_users";
}

/// Fixed permission vocabulary seeded at bootstrap
pub const PERMISSION_VOCABULARY: &[(&str, &str)] = &[
    (perms::VIEW_DASHBOARD, "View the dashboard"),
    (perms::CREATE_SEARCH, "Create and execute searches"),
    (perms::VIEW_LEADS, "View leads"),
    (perms::EXPORT_LEADS, "Export leads"),
    (perms::MANAGE_USERS, "Manage users"),
    (perms::MANAGE_ROLES, "Manage roles"),
    (perms::APPROVE_USERS, "Approve pending users"),
];

/// Permission entity. Atomic and non-hierarchical: a permission never
/// implies another.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Permission {
    pub id: i64,
    /// Capability token (e.g. "view_dashboard")
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Default for Permission {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            description: None,
            created_at: Utc::now(),
        }
    }
}

/// Role entity: a named bag of permissions
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Default for Role {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            description: None,
            created_at: Utc::now(),
        }
    }
}

/// Row values for inserting a role
#[derive(Debug, Clone)]
pub struct NewRole {
    pub name: String,
    pub description: Option<String>,
}

/// Column updates handed to the repository; absent fields keep their value
#[derive(Debug, Clone, Default)]
pub struct UpdateRoleFields {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Role with its permission names (for API responses)
#[derive(Debug, Clone, Serialize)]
pub struct RoleWithPermissions {
    #[serde(flatten)]
    pub role: Role,
    pub permissions: Vec<String>,
}

/// Input for creating a role. Permissions are referenced by name and fully
/// define the grant set.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRoleInput {
    #[validate(length(min = 1, max = 80), custom(function = "validate_rbac_name"))]
    pub name: String,
    #[validate(length(max = 255))]
    pub description: Option<String>,
    pub permissions: Option<Vec<String>>,
}

/// Input for updating a role. `permissions`, when present, replaces the
/// grant set; it is not an additive merge.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateRoleInput {
    #[validate(length(min = 1, max = 80), custom(function = "validate_rbac_name"))]
    pub name: Option<String>,
    #[validate(length(max = 255))]
    pub description: Option<String>,
    pub permissions: Option<Vec<String>>,
}

/// Validate role/permission name format (e.g. "view_leads", "superadmin")
fn validate_rbac_name(name: &str) -> Result<(), validator::ValidationError> {
    if RBAC_NAME_REGEX.is_match(name) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_rbac_name"))
    }
}

lazy_static::lazy_static! {
    pub static ref RBAC_NAME_REGEX: regex::Regex =
        regex::Regex::new(r"^[a-z][a-z0-9_]*$").unwrap();
}
