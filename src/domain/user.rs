//! User domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// User entity
///
/// The password hash never leaves the server: the field is skipped during
/// serialization.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Account usable at all
    pub is_active: bool,
    /// Passed the manual admin approval gate
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Last successful authentication
    pub last_login: Option<DateTime<Utc>>,
}

impl Default for User {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            email: String::new(),
            password_hash: String::new(),
            first_name: None,
            last_name: None,
            is_active: true,
            is_approved: false,
            created_at: now,
            updated_at: now,
            last_login: None,
        }
    }
}

/// User with resolved role names (for API responses)
#[derive(Debug, Clone, Serialize)]
pub struct UserWithRoles {
    #[serde(flatten)]
    pub user: User,
    pub roles: Vec<String>,
}

/// Row values for inserting a new user. The hash is produced by the
/// credential store before this struct is built.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: bool,
    pub is_approved: bool,
}

/// Input for self-registration
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
}

/// Input for login
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Input for the administrative user update. Absent fields keep their
/// current value; `roles` fully replaces the membership set.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateUserInput {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    pub is_active: Option<bool>,
    pub is_approved: Option<bool>,
    #[validate(length(min = 8, max = 128))]
    pub password: Option<String>,
    pub roles: Option<Vec<String>>,
}

/// Listing filter for the administrative user index
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Substring match over email and first/last name
    pub search: Option<String>,
}

/// Resolved column updates handed to the repository (password already hashed)
#[derive(Debug, Clone, Default)]
pub struct UpdateUserFields {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: Option<bool>,
    pub is_approved: Option<bool>,
    pub password_hash: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_user_default() {
        let user = User::default();
        assert!(user.is_active);
        assert!(!user.is_approved);
        assert!(user.last_login.is_none());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            email: "a@x.com".to_string(),
            password_hash: "argon2-material".to_string(),
            ..Default::default()
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2-material"));
        assert!(json.contains("a@x.com"));
    }

    #[test]
    fn test_user_with_roles_flattens() {
        let with_roles = UserWithRoles {
            user: User {
                email: "a@x.com".to_string(),
                ..Default::default()
            },
            roles: vec!["superadmin".to_string()],
        };

        let json = serde_json::to_value(&with_roles).unwrap();
        assert_eq!(json["email"], "a@x.com");
        assert_eq!(json["roles"][0], "superadmin");
    }

    #[test]
    fn test_register_input_validation() {
        let input = RegisterInput {
            email: "not-an-email".to_string(),
            password: "longenough".to_string(),
            first_name: None,
            last_name: None,
        };
        assert!(input.validate().is_err());

        let input = RegisterInput {
            email: "user@example.com".to_string(),
            password: "short".to_string(),
            first_name: None,
            last_name: None,
        };
        assert!(input.validate().is_err());

        let input = RegisterInput {
            email: "user@example.com".to_string(),
            password: "longenough".to_string(),
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_update_user_input_partial() {
        let input = UpdateUserInput {
            email: None,
            first_name: Some("Grace".to_string()),
            last_name: None,
            is_active: None,
            is_approved: Some(true),
            password: None,
            roles: None,
        };
        assert!(input.validate().is_ok());
    }
}
