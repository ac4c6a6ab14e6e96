//! Authentication flows: register, login, refresh

use crate::crypto;
use crate::domain::{LoginInput, NewUser, RegisterInput, User, UserWithRoles};
use crate::error::{AppError, Result};
use crate::jwt::JwtManager;
use crate::repository::UserRepository;
use serde::Serialize;
use std::sync::Arc;
use validator::Validate;

/// Successful login payload
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserWithRoles,
}

/// Successful refresh payload
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

pub struct AuthService<U: UserRepository> {
    users: Arc<U>,
    jwt: JwtManager,
}

impl<U: UserRepository> AuthService<U> {
    pub fn new(users: Arc<U>, jwt: JwtManager) -> Self {
        Self { users, jwt }
    }

    /// Controlled signup: the account is created active but unapproved and
    /// cannot log in until an administrator approves it.
    pub async fn register(&self, input: RegisterInput) -> Result<UserWithRoles> {
        input.validate()?;

        if self.users.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::Conflict("Email is already registered".to_string()));
        }

        let password_hash = crypto::hash_password(&input.password)?;
        let user = self
            .users
            .create(&NewUser {
                email: input.email,
                password_hash,
                first_name: input.first_name,
                last_name: input.last_name,
                is_active: true,
                is_approved: false,
            })
            .await?;

        self.with_roles(user).await
    }

    /// Login with email + password. The same denial covers an unknown email
    /// and a wrong password; activity and approval gates are reported
    /// specifically once the credential itself checks out.
    pub async fn login(&self, input: LoginInput) -> Result<LoginResponse> {
        input.validate()?;

        let user = self
            .users
            .find_by_email(&input.email)
            .await?
            .ok_or_else(invalid_credentials)?;

        if !crypto::verify_password(&input.password, &user.password_hash) {
            return Err(invalid_credentials());
        }

        if !user.is_active {
            return Err(AppError::Inactive);
        }

        if !user.is_approved {
            return Err(AppError::Unapproved);
        }

        self.users.record_login(user.id).await?;

        let access_token = self.jwt.create_access_token(user.id, &user.email)?;
        let refresh_token = self.jwt.create_refresh_token(user.id)?;
        let user = self.with_roles(user).await?;

        Ok(LoginResponse {
            access_token,
            refresh_token,
            user,
        })
    }

    /// Exchange a refresh token for a fresh access token. The user is
    /// re-loaded so a deleted or deactivated account invalidates all of its
    /// outstanding refresh tokens at validation time.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse> {
        let claims = self.jwt.verify_refresh_token(refresh_token)?;
        let user_id = JwtManager::subject_user_id(&claims.sub)?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(invalid_credentials)?;

        if !user.is_active {
            return Err(AppError::Inactive);
        }

        let access_token = self.jwt.create_access_token(user.id, &user.email)?;
        Ok(RefreshResponse { access_token })
    }

    /// Attach resolved role names to a user
    pub async fn with_roles(&self, user: User) -> Result<UserWithRoles> {
        let roles = self
            .users
            .find_roles(user.id)
            .await?
            .into_iter()
            .map(|role| role.name)
            .collect();

        Ok(UserWithRoles { user, roles })
    }
}

fn invalid_credentials() -> AppError {
    AppError::Unauthenticated("invalid email or password".to_string())
}
