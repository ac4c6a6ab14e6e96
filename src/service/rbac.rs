//! Role and permission administration

use crate::domain::{
    CreateRoleInput, NewRole, Permission, Role, RoleWithPermissions, UpdateRoleFields,
    UpdateRoleInput, SUPERADMIN_ROLE,
};
use crate::error::{AppError, Result};
use crate::repository::RbacRepository;
use std::collections::HashSet;
use std::sync::Arc;
use validator::Validate;

pub struct RbacAdminService<R: RbacRepository> {
    rbac: Arc<R>,
}

impl<R: RbacRepository> RbacAdminService<R> {
    pub fn new(rbac: Arc<R>) -> Self {
        Self { rbac }
    }

    pub async fn list_roles(&self) -> Result<Vec<RoleWithPermissions>> {
        let roles = self.rbac.list_roles().await?;

        let mut items = Vec::with_capacity(roles.len());
        for role in roles {
            items.push(self.with_permissions(role).await?);
        }

        Ok(items)
    }

    pub async fn get_role(&self, id: i64) -> Result<RoleWithPermissions> {
        let role = self
            .rbac
            .find_role_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Role {} not found", id)))?;

        self.with_permissions(role).await
    }

    pub async fn create_role(&self, input: CreateRoleInput) -> Result<RoleWithPermissions> {
        input.validate()?;

        if self.rbac.find_role_by_name(&input.name).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "Role {} already exists",
                input.name
            )));
        }

        let role = self
            .rbac
            .create_role(&NewRole {
                name: input.name,
                description: input.description,
            })
            .await?;

        if let Some(permission_names) = input.permissions {
            let permission_ids = self.resolve_permission_ids(&permission_names).await?;
            self.rbac
                .set_role_permissions(role.id, &permission_ids)
                .await?;
        }

        self.with_permissions(role).await
    }

    /// Update name/description and, when given, replace the grant set.
    /// Renaming the superadmin role is a policy violation, checked before
    /// any write.
    pub async fn update_role(&self, id: i64, input: UpdateRoleInput) -> Result<RoleWithPermissions> {
        input.validate()?;

        let existing = self
            .rbac
            .find_role_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Role {} not found", id)))?;

        if let Some(new_name) = &input.name {
            if *new_name != existing.name {
                if existing.name == SUPERADMIN_ROLE {
                    return Err(AppError::PolicyViolation(
                        "The superadmin role cannot be renamed".to_string(),
                    ));
                }
                if self.rbac.find_role_by_name(new_name).await?.is_some() {
                    return Err(AppError::Conflict(format!(
                        "Role {} already exists",
                        new_name
                    )));
                }
            }
        }

        let role = self
            .rbac
            .update_role(
                id,
                &UpdateRoleFields {
                    name: input.name,
                    description: input.description,
                },
            )
            .await?;

        if let Some(permission_names) = input.permissions {
            let permission_ids = self.resolve_permission_ids(&permission_names).await?;
            self.rbac
                .set_role_permissions(role.id, &permission_ids)
                .await?;
        }

        self.with_permissions(role).await
    }

    /// Deleting the superadmin role is a policy violation, checked before
    /// the delete is issued.
    pub async fn delete_role(&self, id: i64) -> Result<()> {
        let existing = self
            .rbac
            .find_role_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Role {} not found", id)))?;

        if existing.name == SUPERADMIN_ROLE {
            return Err(AppError::PolicyViolation(
                "The superadmin role cannot be deleted".to_string(),
            ));
        }

        self.rbac.delete_role(id).await
    }

    pub async fn list_permissions(&self) -> Result<Vec<Permission>> {
        self.rbac.list_permissions().await
    }

    async fn resolve_permission_ids(&self, names: &[String]) -> Result<Vec<i64>> {
        let permissions = self.rbac.find_permissions_by_names(names).await?;

        let found: HashSet<&str> = permissions.iter().map(|p| p.name.as_str()).collect();
        for name in names {
            if !found.contains(name.as_str()) {
                return Err(AppError::NotFound(format!("Permission {} not found", name)));
            }
        }

        Ok(permissions.into_iter().map(|p| p.id).collect())
    }

    async fn with_permissions(&self, role: Role) -> Result<RoleWithPermissions> {
        let permissions = self
            .rbac
            .find_role_permissions(role.id)
            .await?
            .into_iter()
            .map(|p| p.name)
            .collect();

        Ok(RoleWithPermissions { role, permissions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::rbac::MockRbacRepository;
    use mockall::predicate::*;

    fn role(id: i64, name: &str) -> Role {
        Role {
            id,
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn permission(id: i64, name: &str) -> Permission {
        Permission {
            id,
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn service(mock: MockRbacRepository) -> RbacAdminService<MockRbacRepository> {
        RbacAdminService::new(Arc::new(mock))
    }

    #[tokio::test]
    async fn test_rename_superadmin_is_policy_violation() {
        let mut mock = MockRbacRepository::new();
        mock.expect_find_role_by_id()
            .with(eq(1))
            .returning(|_| Ok(Some(role(1, SUPERADMIN_ROLE))));
        // No expect_update_role: the violation must fire before any write.

        let input = UpdateRoleInput {
            name: Some("admin".to_string()),
            description: None,
            permissions: None,
        };

        let result = service(mock).update_role(1, input).await;
        assert!(matches!(result, Err(AppError::PolicyViolation(_))));
    }

    #[tokio::test]
    async fn test_superadmin_description_update_allowed() {
        let mut mock = MockRbacRepository::new();
        mock.expect_find_role_by_id()
            .with(eq(1))
            .returning(|_| Ok(Some(role(1, SUPERADMIN_ROLE))));
        mock.expect_update_role()
            .returning(|id, _| Ok(role(id, SUPERADMIN_ROLE)));
        mock.expect_find_role_permissions()
            .with(eq(1))
            .returning(|_| Ok(vec![]));

        let input = UpdateRoleInput {
            name: None,
            description: Some("All permissions".to_string()),
            permissions: None,
        };

        service(mock).update_role(1, input).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_superadmin_role_is_policy_violation() {
        let mut mock = MockRbacRepository::new();
        mock.expect_find_role_by_id()
            .with(eq(1))
            .returning(|_| Ok(Some(role(1, SUPERADMIN_ROLE))));
        // No expect_delete_role.

        let result = service(mock).delete_role(1).await;
        assert!(matches!(result, Err(AppError::PolicyViolation(_))));
    }

    #[tokio::test]
    async fn test_delete_regular_role_succeeds() {
        let mut mock = MockRbacRepository::new();
        mock.expect_find_role_by_id()
            .with(eq(5))
            .returning(|_| Ok(Some(role(5, "analyst"))));
        mock.expect_delete_role().with(eq(5)).returning(|_| Ok(()));

        service(mock).delete_role(5).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_role_duplicate_name_conflicts() {
        let mut mock = MockRbacRepository::new();
        mock.expect_find_role_by_name()
            .with(eq("analyst"))
            .returning(|_| Ok(Some(role(5, "analyst"))));

        let input = CreateRoleInput {
            name: "analyst".to_string(),
            description: None,
            permissions: None,
        };

        let result = service(mock).create_role(input).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_replaces_grant_set_exactly() {
        let mut mock = MockRbacRepository::new();
        mock.expect_find_role_by_id()
            .with(eq(5))
            .returning(|_| Ok(Some(role(5, "analyst"))));
        mock.expect_update_role()
            .returning(|id, _| Ok(role(id, "analyst")));
        mock.expect_find_permissions_by_names()
            .returning(|_| Ok(vec![permission(1, "view_leads")]));
        mock.expect_set_role_permissions()
            .withf(|role_id, permission_ids| *role_id == 5 && permission_ids == [1])
            .returning(|_, _| Ok(()));
        mock.expect_find_role_permissions()
            .with(eq(5))
            .returning(|_| Ok(vec![permission(1, "view_leads")]));

        let input = UpdateRoleInput {
            name: None,
            description: None,
            permissions: Some(vec!["view_leads".to_string()]),
        };

        let result = service(mock).update_role(5, input).await.unwrap();
        assert_eq!(result.permissions, vec!["view_leads"]);
    }

    #[tokio::test]
    async fn test_unknown_permission_name_fails_before_replacement() {
        let mut mock = MockRbacRepository::new();
        mock.expect_find_role_by_id()
            .with(eq(5))
            .returning(|_| Ok(Some(role(5, "analyst"))));
        mock.expect_update_role()
            .returning(|id, _| Ok(role(id, "analyst")));
        mock.expect_find_permissions_by_names()
            .returning(|_| Ok(vec![]));
        // No expect_set_role_permissions.

        let input = UpdateRoleInput {
            name: None,
            description: None,
            permissions: Some(vec!["no_such_permission".to_string()]),
        };

        let result = service(mock).update_role(5, input).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_role_invalid_name_rejected() {
        let input = CreateRoleInput {
            name: "Not Valid".to_string(),
            description: None,
            permissions: None,
        };

        let result = service(MockRbacRepository::new()).create_role(input).await;
        assert!(matches!(result, Err(AppError::Invalid(_))));
    }
}
