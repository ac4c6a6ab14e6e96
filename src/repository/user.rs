//! User repository

use crate::domain::{NewUser, Role, UpdateUserFields, User, UserFilter};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::PgPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, input: &NewUser) -> Result<User>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;
    /// Exact, case-sensitive match on the unique email index
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn list(&self, filter: &UserFilter, offset: i64, limit: i64) -> Result<Vec<User>>;
    async fn count(&self, filter: &UserFilter) -> Result<i64>;
    async fn find_unapproved(&self) -> Result<Vec<User>>;
    async fn update(&self, id: i64, fields: &UpdateUserFields) -> Result<User>;
    async fn approve(&self, id: i64) -> Result<User>;
    async fn record_login(&self, id: i64) -> Result<()>;
    async fn delete(&self, id: i64) -> Result<()>;

    // User-Role relations
    async fn find_roles(&self, user_id: i64) -> Result<Vec<Role>>;
    /// Fully replaces the membership set; not an additive merge
    async fn set_roles(&self, user_id: i64, role_ids: &[i64]) -> Result<()>;
    /// Distinct permission names granted through any held role
    async fn find_permissions(&self, user_id: i64) -> Result<Vec<String>>;
}

pub struct UserRepositoryImpl {
    pool: PgPool,
}

impl UserRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for UserRepositoryImpl {
    async fn create(&self, input: &NewUser) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name, is_active, is_approved)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, email, password_hash, first_name, last_name, is_active, is_approved,
                      created_at, updated_at, last_login
            "#,
        )
        .bind(&input.email)
        .bind(&input.password_hash)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(input.is_active)
        .bind(input.is_approved)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, first_name, last_name, is_active, is_approved,
                   created_at, updated_at, last_login
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, first_name, last_name, is_active, is_approved,
                   created_at, updated_at, last_login
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn list(&self, filter: &UserFilter, offset: i64, limit: i64) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, first_name, last_name, is_active, is_approved,
                   created_at, updated_at, last_login
            FROM users
            WHERE ($1::text IS NULL
                   OR email ILIKE '%' || $1 || '%'
                   OR first_name ILIKE '%' || $1 || '%'
                   OR last_name ILIKE '%' || $1 || '%')
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&filter.search)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn count(&self, filter: &UserFilter) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM users
            WHERE ($1::text IS NULL
                   OR email ILIKE '%' || $1 || '%'
                   OR first_name ILIKE '%' || $1 || '%'
                   OR last_name ILIKE '%' || $1 || '%')
            "#,
        )
        .bind(&filter.search)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    async fn find_unapproved(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, first_name, last_name, is_active, is_approved,
                   created_at, updated_at, last_login
            FROM users
            WHERE is_approved = FALSE
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn update(&self, id: i64, fields: &UpdateUserFields) -> Result<User> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

        let email = fields.email.as_ref().unwrap_or(&existing.email);
        let first_name = fields.first_name.as_ref().or(existing.first_name.as_ref());
        let last_name = fields.last_name.as_ref().or(existing.last_name.as_ref());
        let is_active = fields.is_active.unwrap_or(existing.is_active);
        let is_approved = fields.is_approved.unwrap_or(existing.is_approved);
        let password_hash = fields
            .password_hash
            .as_ref()
            .unwrap_or(&existing.password_hash);

        sqlx::query(
            r#"
            UPDATE users
            SET email = $1, first_name = $2, last_name = $3, is_active = $4,
                is_approved = $5, password_hash = $6, updated_at = NOW()
            WHERE id = $7
            "#,
        )
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(is_active)
        .bind(is_approved)
        .bind(password_hash)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to update user")))
    }

    async fn approve(&self, id: i64) -> Result<User> {
        let result = sqlx::query(
            "UPDATE users SET is_approved = TRUE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to approve user")))
    }

    async fn record_login(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = NOW(), updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        // Search queries and leads fall with the user via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }

        Ok(())
    }

    async fn find_roles(&self, user_id: i64) -> Result<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>(
            r#"
            SELECT r.id, r.name, r.description, r.created_at
            FROM roles r
            INNER JOIN user_roles ur ON r.id = ur.role_id
            WHERE ur.user_id = $1
            ORDER BY r.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }

    async fn set_roles(&self, user_id: i64, role_ids: &[i64]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for role_id in role_ids {
            sqlx::query(
                "INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(user_id)
            .bind(role_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_permissions(&self, user_id: i64) -> Result<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT p.name
            FROM permissions p
            INNER JOIN role_permissions rp ON p.id = rp.permission_id
            INNER JOIN user_roles ur ON ur.role_id = rp.role_id
            WHERE ur.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }
}
