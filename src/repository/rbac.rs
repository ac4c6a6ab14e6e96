//! RBAC repository

use crate::domain::{NewRole, Permission, Role, UpdateRoleFields};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::PgPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RbacRepository: Send + Sync {
    // Permissions
    /// Insert-if-missing; an existing row (including its description) is
    /// left untouched.
    async fn ensure_permission(&self, name: &str, description: &str) -> Result<()>;
    async fn find_permission_by_name(&self, name: &str) -> Result<Option<Permission>>;
    async fn find_permissions_by_names(&self, names: &[String]) -> Result<Vec<Permission>>;
    async fn list_permissions(&self) -> Result<Vec<Permission>>;

    // Roles
    async fn create_role(&self, input: &NewRole) -> Result<Role>;
    /// Conflict-tolerant creation: `None` means the role already existed,
    /// possibly created concurrently by another process.
    async fn create_role_if_absent(&self, input: &NewRole) -> Result<Option<Role>>;
    async fn find_role_by_id(&self, id: i64) -> Result<Option<Role>>;
    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>>;
    async fn find_roles_by_names(&self, names: &[String]) -> Result<Vec<Role>>;
    async fn list_roles(&self) -> Result<Vec<Role>>;
    async fn update_role(&self, id: i64, fields: &UpdateRoleFields) -> Result<Role>;
    async fn delete_role(&self, id: i64) -> Result<()>;

    // Role-Permission mapping
    /// Fully replaces the grant set; not an additive merge
    async fn set_role_permissions(&self, role_id: i64, permission_ids: &[i64]) -> Result<()>;
    async fn find_role_permissions(&self, role_id: i64) -> Result<Vec<Permission>>;
}

pub struct RbacRepositoryImpl {
    pool: PgPool,
}

impl RbacRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RbacRepository for RbacRepositoryImpl {
    async fn ensure_permission(&self, name: &str, description: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO permissions (name, description)
            VALUES ($1, $2)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(name)
        .bind(description)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_permission_by_name(&self, name: &str) -> Result<Option<Permission>> {
        let permission = sqlx::query_as::<_, Permission>(
            "SELECT id, name, description, created_at FROM permissions WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(permission)
    }

    async fn find_permissions_by_names(&self, names: &[String]) -> Result<Vec<Permission>> {
        let permissions = sqlx::query_as::<_, Permission>(
            "SELECT id, name, description, created_at FROM permissions WHERE name = ANY($1)",
        )
        .bind(names)
        .fetch_all(&self.pool)
        .await?;

        Ok(permissions)
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>> {
        let permissions = sqlx::query_as::<_, Permission>(
            "SELECT id, name, description, created_at FROM permissions ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(permissions)
    }

    async fn create_role(&self, input: &NewRole) -> Result<Role> {
        let role = sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description, created_at
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(role)
    }

    async fn create_role_if_absent(&self, input: &NewRole) -> Result<Option<Role>> {
        let role = sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (name, description)
            VALUES ($1, $2)
            ON CONFLICT (name) DO NOTHING
            RETURNING id, name, description, created_at
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .fetch_optional(&self.pool)
        .await?;

        Ok(role)
    }

    async fn find_role_by_id(&self, id: i64) -> Result<Option<Role>> {
        let role = sqlx::query_as::<_, Role>(
            "SELECT id, name, description, created_at FROM roles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(role)
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>> {
        let role = sqlx::query_as::<_, Role>(
            "SELECT id, name, description, created_at FROM roles WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(role)
    }

    async fn find_roles_by_names(&self, names: &[String]) -> Result<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>(
            "SELECT id, name, description, created_at FROM roles WHERE name = ANY($1)",
        )
        .bind(names)
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>(
            "SELECT id, name, description, created_at FROM roles ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }

    async fn update_role(&self, id: i64, fields: &UpdateRoleFields) -> Result<Role> {
        let existing = self
            .find_role_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Role {} not found", id)))?;

        let name = fields.name.as_ref().unwrap_or(&existing.name);
        let description = fields.description.as_ref().or(existing.description.as_ref());

        sqlx::query("UPDATE roles SET name = $1, description = $2 WHERE id = $3")
            .bind(name)
            .bind(description)
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.find_role_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to update role")))
    }

    async fn delete_role(&self, id: i64) -> Result<()> {
        // Join-table rows fall with the role via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Role {} not found", id)));
        }

        Ok(())
    }

    async fn set_role_permissions(&self, role_id: i64, permission_ids: &[i64]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(role_id)
            .execute(&mut *tx)
            .await?;

        for permission_id in permission_ids {
            sqlx::query(
                r#"
                INSERT INTO role_permissions (role_id, permission_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(role_id)
            .bind(permission_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_role_permissions(&self, role_id: i64) -> Result<Vec<Permission>> {
        let permissions = sqlx::query_as::<_, Permission>(
            r#"
            SELECT p.id, p.name, p.description, p.created_at
            FROM permissions p
            INNER JOIN role_permissions rp ON p.id = rp.permission_id
            WHERE rp.role_id = $1
            ORDER BY p.name
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(permissions)
    }
}
