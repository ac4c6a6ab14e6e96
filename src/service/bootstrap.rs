//! Idempotent bootstrap: permission vocabulary, superadmin role, superadmin
//! account
//!
//! Safe to run on every startup and under concurrent process startup: all
//! inserts are conflict-tolerant, and an existing superadmin account is
//! never touched (in particular its password hash is never reset).

use crate::config::SuperadminConfig;
use crate::crypto;
use crate::domain::{NewRole, NewUser, Role, PERMISSION_VOCABULARY, SUPERADMIN_ROLE};
use crate::error::{AppError, Result};
use crate::repository::{RbacRepository, UserRepository};
use tracing::{debug, info};

const SUPERADMIN_ROLE_DESCRIPTION: &str = "Administrator holding every permission";

pub async fn run<U, R>(users: &U, rbac: &R, superadmin: &SuperadminConfig) -> Result<()>
where
    U: UserRepository,
    R: RbacRepository,
{
    ensure_permissions(rbac).await?;
    let role = ensure_superadmin_role(rbac).await?;
    ensure_superadmin_user(users, superadmin, &role).await?;
    Ok(())
}

/// Create missing vocabulary entries; existing rows (including their
/// descriptions) are left untouched.
async fn ensure_permissions<R: RbacRepository>(rbac: &R) -> Result<()> {
    for (name, description) in PERMISSION_VOCABULARY {
        rbac.ensure_permission(name, description).await?;
    }
    Ok(())
}

/// Ensure the superadmin role exists. Only a newly created role receives
/// the full grant set; an existing role's grants are the administrator's
/// business.
async fn ensure_superadmin_role<R: RbacRepository>(rbac: &R) -> Result<Role> {
    let new_role = NewRole {
        name: SUPERADMIN_ROLE.to_string(),
        description: Some(SUPERADMIN_ROLE_DESCRIPTION.to_string()),
    };

    match rbac.create_role_if_absent(&new_role).await? {
        Some(role) => {
            let permissions = rbac.list_permissions().await?;
            let permission_ids: Vec<i64> = permissions.iter().map(|p| p.id).collect();
            rbac.set_role_permissions(role.id, &permission_ids).await?;
            info!(role = SUPERADMIN_ROLE, "superadmin role created");
            Ok(role)
        }
        None => rbac
            .find_role_by_name(SUPERADMIN_ROLE)
            .await?
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!("superadmin role missing after bootstrap"))
            }),
    }
}

/// Ensure the superadmin account exists. A concurrent creation by another
/// process surfaces as a uniqueness conflict and counts as already
/// bootstrapped.
async fn ensure_superadmin_user<U: UserRepository>(
    users: &U,
    superadmin: &SuperadminConfig,
    role: &Role,
) -> Result<()> {
    if users.find_by_email(&superadmin.email).await?.is_some() {
        debug!("superadmin account already present");
        return Ok(());
    }

    let password_hash = crypto::hash_password(&superadmin.password)?;
    let new_user = NewUser {
        email: superadmin.email.clone(),
        password_hash,
        first_name: Some("Super".to_string()),
        last_name: Some("Admin".to_string()),
        is_active: true,
        is_approved: true,
    };

    match users.create(&new_user).await {
        Ok(user) => {
            users.set_roles(user.id, &[role.id]).await?;
            info!(email = %superadmin.email, "superadmin account created");
            Ok(())
        }
        Err(AppError::Conflict(_)) => {
            debug!("superadmin account created concurrently");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Permission, User};
    use crate::repository::rbac::MockRbacRepository;
    use crate::repository::user::MockUserRepository;
    use mockall::predicate::*;

    fn config() -> SuperadminConfig {
        SuperadminConfig {
            email: "admin@leadscout.test".to_string(),
            password: "provisioning-secret".to_string(),
        }
    }

    fn superadmin_role(id: i64) -> Role {
        Role {
            id,
            name: SUPERADMIN_ROLE.to_string(),
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

    #[tokio::test]
    async fn test_first_run_creates_everything() {
        let mut rbac = MockRbacRepository::new();
        rbac.expect_ensure_permission()
            .times(PERMISSION_VOCABULARY.len())
            .returning(|_, _| Ok(()));
        rbac.expect_create_role_if_absent()
            .withf(|input: &NewRole| input.name == SUPERADMIN_ROLE)
            .returning(|_| Ok(Some(superadmin_role(1))));
        rbac.expect_list_permissions().returning(|| {
            Ok(vec![permission(10, "view_dashboard"), permission(11, "view_leads")])
        });
        rbac.expect_set_role_permissions()
            .withf(|role_id, permission_ids| *role_id == 1 && permission_ids == [10, 11])
            .returning(|_, _| Ok(()));

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .with(eq("admin@leadscout.test"))
            .returning(|_| Ok(None));
        users
            .expect_create()
            .withf(|input: &NewUser| {
                input.is_active
                    && input.is_approved
                    && crypto::verify_password("provisioning-secret", &input.password_hash)
            })
            .returning(|input| {
                Ok(User {
                    id: 1,
                    email: input.email.clone(),
                    password_hash: input.password_hash.clone(),
                    is_active: true,
                    is_approved: true,
                    ..Default::default()
                })
            });
        users
            .expect_set_roles()
            .withf(|user_id, role_ids| *user_id == 1 && role_ids == [1])
            .returning(|_, _| Ok(()));

        run(&users, &rbac, &config()).await.unwrap();
    }

    #[tokio::test]
    async fn test_second_run_changes_nothing() {
        let mut rbac = MockRbacRepository::new();
        rbac.expect_ensure_permission()
            .times(PERMISSION_VOCABULARY.len())
            .returning(|_, _| Ok(()));
        rbac.expect_create_role_if_absent()
            .returning(|_| Ok(None));
        rbac.expect_find_role_by_name()
            .with(eq(SUPERADMIN_ROLE))
            .returning(|_| Ok(Some(superadmin_role(1))));
        // No set_role_permissions: an existing role keeps its grants.

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .with(eq("admin@leadscout.test"))
            .returning(|_| {
                Ok(Some(User {
                    id: 1,
                    email: "admin@leadscout.test".to_string(),
                    password_hash: "existing-hash-stays".to_string(),
                    is_active: true,
                    is_approved: true,
                    ..Default::default()
                }))
            });
        // No create/update/set_roles: the existing account is untouched and
        // its password hash is never reset.

        run(&users, &rbac, &config()).await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_user_insert_conflict_is_already_bootstrapped() {
        let mut rbac = MockRbacRepository::new();
        rbac.expect_ensure_permission().returning(|_, _| Ok(()));
        rbac.expect_create_role_if_absent()
            .returning(|_| Ok(None));
        rbac.expect_find_role_by_name()
            .returning(|_| Ok(Some(superadmin_role(1))));

        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        users
            .expect_create()
            .returning(|_| Err(AppError::Conflict("duplicate email".to_string())));
        // No set_roles: the concurrent creator owns the assignment.

        run(&users, &rbac, &config()).await.unwrap();
    }
}
