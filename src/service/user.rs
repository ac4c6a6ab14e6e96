//! User administration

use crate::crypto;
use crate::domain::{
    UpdateUserFields, UpdateUserInput, User, UserFilter, UserWithRoles, SUPERADMIN_ROLE,
};
use crate::error::{AppError, Result};
use crate::repository::{RbacRepository, UserRepository};
use crate::service::Paginated;
use std::collections::HashSet;
use std::sync::Arc;
use validator::Validate;

pub struct UserService<U: UserRepository, R: RbacRepository> {
    users: Arc<U>,
    rbac: Arc<R>,
}

impl<U: UserRepository, R: RbacRepository> UserService<U, R> {
    pub fn new(users: Arc<U>, rbac: Arc<R>) -> Self {
        Self { users, rbac }
    }

    pub async fn list(
        &self,
        search: Option<&str>,
        page: i64,
        per_page: i64,
    ) -> Result<Paginated<UserWithRoles>> {
        let filter = UserFilter {
            search: search.map(str::to_string),
        };

        let offset = (page - 1) * per_page;
        let users = self.users.list(&filter, offset, per_page).await?;
        let total = self.users.count(&filter).await?;

        let mut items = Vec::with_capacity(users.len());
        for user in users {
            items.push(self.with_roles(user).await?);
        }

        Ok(Paginated::new(items, total, page, per_page))
    }

    pub async fn get(&self, id: i64) -> Result<UserWithRoles> {
        let user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

        self.with_roles(user).await
    }

    /// Administrative update. Protections are evaluated before any write:
    /// the superadmin account's email is immutable, and an email change must
    /// not collide with another account.
    pub async fn update(&self, id: i64, input: UpdateUserInput) -> Result<UserWithRoles> {
        input.validate()?;

        let existing = self
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

        if let Some(email) = &input.email {
            if *email != existing.email {
                if self.holds_superadmin(id).await? {
                    return Err(AppError::PolicyViolation(
                        "The superadmin email cannot be changed".to_string(),
                    ));
                }
                if let Some(other) = self.users.find_by_email(email).await? {
                    if other.id != id {
                        return Err(AppError::Conflict("Email is already in use".to_string()));
                    }
                }
            }
        }

        let password_hash = match input.password.as_deref() {
            Some(password) => Some(crypto::hash_password(password)?),
            None => None,
        };

        let user = self
            .users
            .update(
                id,
                &UpdateUserFields {
                    email: input.email,
                    first_name: input.first_name,
                    last_name: input.last_name,
                    is_active: input.is_active,
                    is_approved: input.is_approved,
                    password_hash,
                },
            )
            .await?;

        if let Some(role_names) = input.roles {
            let role_ids = self.resolve_role_ids(&role_names).await?;
            self.users.set_roles(id, &role_ids).await?;
        }

        self.with_roles(user).await
    }

    /// Deleting a user holding the superadmin role is a policy violation,
    /// checked before the delete is issued.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let _ = self
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

        if self.holds_superadmin(id).await? {
            return Err(AppError::PolicyViolation(
                "The superadmin user cannot be deleted".to_string(),
            ));
        }

        self.users.delete(id).await
    }

    pub async fn approve(&self, id: i64) -> Result<UserWithRoles> {
        let user = self.users.approve(id).await?;
        self.with_roles(user).await
    }

    pub async fn pending(&self) -> Result<Vec<UserWithRoles>> {
        let users = self.users.find_unapproved().await?;

        let mut items = Vec::with_capacity(users.len());
        for user in users {
            items.push(self.with_roles(user).await?);
        }

        Ok(items)
    }

    async fn holds_superadmin(&self, user_id: i64) -> Result<bool> {
        let roles = self.users.find_roles(user_id).await?;
        Ok(roles.iter().any(|role| role.name == SUPERADMIN_ROLE))
    }

    async fn resolve_role_ids(&self, names: &[String]) -> Result<Vec<i64>> {
        let roles = self.rbac.find_roles_by_names(names).await?;

        let found: HashSet<&str> = roles.iter().map(|role| role.name.as_str()).collect();
        for name in names {
            if !found.contains(name.as_str()) {
                return Err(AppError::NotFound(format!("Role {} not found", name)));
            }
        }

        Ok(roles.into_iter().map(|role| role.id).collect())
    }

    async fn with_roles(&self, user: User) -> Result<UserWithRoles> {
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
