//! Authorization decision engine
//!
//! Every protected operation declares one `Requirement` and, where it
//! touches owned resources, an ownership rule. The engine resolves both
//! against the authoritative store at decision time:
//!
//! 1. validate the bearer credential
//! 2. load the caller and check `is_active`
//! 3. evaluate the requirement against resolved roles/permissions
//! 4. optionally check resource ownership (superadmin bypasses this step,
//!    and only this step)
//!
//! Holding the `superadmin` role is an unconditional ownership bypass but
//! NOT a permission bypass: permission requirements are always evaluated
//! against the caller's actual grants.

use crate::domain::{User, SUPERADMIN_ROLE};
use crate::error::{AppError, Result};
use crate::jwt::JwtManager;
use crate::repository::UserRepository;
use std::sync::Arc;

/// A capability a route requires: a permission name or a role name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    Permission(String),
    Role(String),
}

impl Requirement {
    pub fn permission(name: impl Into<String>) -> Self {
        Requirement::Permission(name.into())
    }

    pub fn role(name: impl Into<String>) -> Self {
        Requirement::Role(name.into())
    }

    fn capability_name(&self) -> &str {
        match self {
            Requirement::Permission(name) => name,
            Requirement::Role(name) => name,
        }
    }
}

/// Row-level visibility for list/export/aggregate operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerScope {
    /// Superadmin: no owner filter
    All,
    /// Everyone else: rows owned by this user id only
    Owner(i64),
}

impl OwnerScope {
    /// Owner filter for repository queries (`None` = unfiltered)
    pub fn as_filter(&self) -> Option<i64> {
        match self {
            OwnerScope::All => None,
            OwnerScope::Owner(id) => Some(*id),
        }
    }
}

pub struct AuthzEngine<U: UserRepository> {
    users: Arc<U>,
    jwt: JwtManager,
}

impl<U: UserRepository> AuthzEngine<U> {
    pub fn new(users: Arc<U>, jwt: JwtManager) -> Self {
        Self { users, jwt }
    }

    pub fn jwt(&self) -> &JwtManager {
        &self.jwt
    }

    /// Steps 1–2: validate the access token and load an active caller.
    /// Used directly by routes that require authentication only (`/me`).
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let claims = self.jwt.verify_access_token(token)?;
        let user_id = JwtManager::subject_user_id(&claims.sub)?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        if !user.is_active {
            return Err(AppError::Inactive);
        }

        Ok(user)
    }

    /// Full decision procedure for one requirement. Returns the resolved
    /// caller for downstream use.
    pub async fn authorize(&self, token: &str, requirement: &Requirement) -> Result<User> {
        let user = self.authenticate(token).await?;

        let satisfied = match requirement {
            Requirement::Permission(name) => self
                .users
                .find_permissions(user.id)
                .await?
                .iter()
                .any(|granted| granted == name),
            Requirement::Role(name) => self
                .users
                .find_roles(user.id)
                .await?
                .iter()
                .any(|role| role.name == *name),
        };

        if !satisfied {
            return Err(AppError::InsufficientPrivilege(
                requirement.capability_name().to_string(),
            ));
        }

        Ok(user)
    }

    /// Requirement plus ownership in one call.
    pub async fn authorize_owner(
        &self,
        token: &str,
        requirement: &Requirement,
        resource_owner_id: i64,
    ) -> Result<User> {
        let user = self.authorize(token, requirement).await?;
        self.check_owner(&user, resource_owner_id).await?;
        Ok(user)
    }

    /// Step 4: ownership gate. Superadmin passes unconditionally; everyone
    /// else must own the resource.
    pub async fn check_owner(&self, user: &User, resource_owner_id: i64) -> Result<()> {
        if user.id == resource_owner_id || self.is_superadmin(user).await? {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "resource belongs to another user".to_string(),
            ))
        }
    }

    /// Row-level scope for list/export/aggregate operations.
    pub async fn scope(&self, user: &User) -> Result<OwnerScope> {
        if self.is_superadmin(user).await? {
            Ok(OwnerScope::All)
        } else {
            Ok(OwnerScope::Owner(user.id))
        }
    }

    async fn is_superadmin(&self, user: &User) -> Result<bool> {
        let roles = self.users.find_roles(user.id).await?;
        Ok(roles.iter().any(|role| role.name == SUPERADMIN_ROLE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use crate::domain::{perms, Role};
    use crate::repository::user::MockUserRepository;
    use mockall::predicate::*;

    fn jwt_manager() -> JwtManager {
        JwtManager::new(JwtConfig {
            secret: "policy-test-secret".to_string(),
            issuer: "https://leadscout.test".to_string(),
            access_token_ttl_secs: 3600,
            refresh_token_ttl_secs: 86400,
        })
    }

    fn active_user(id: i64) -> User {
        User {
            id,
            email: format!("user{}@example.com", id),
            is_active: true,
            is_approved: true,
            ..Default::default()
        }
    }

    fn role(name: &str) -> Role {
        Role {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn engine(mock: MockUserRepository) -> AuthzEngine<MockUserRepository> {
        AuthzEngine::new(Arc::new(mock), jwt_manager())
    }

    fn token_for(id: i64) -> String {
        jwt_manager()
            .create_access_token(id, &format!("user{}@example.com", id))
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_or_garbage_token_is_unauthenticated() {
        let authz = engine(MockUserRepository::new());

        let result = authz
            .authorize("garbage", &Requirement::permission(perms::VIEW_LEADS))
            .await;
        assert!(matches!(result, Err(AppError::Unauthenticated(_))));
    }

    #[tokio::test]
    async fn test_refresh_token_cannot_authorize_resource_access() {
        let authz = engine(MockUserRepository::new());
        let refresh = jwt_manager().create_refresh_token(1).unwrap();

        let result = authz
            .authorize(&refresh, &Requirement::permission(perms::VIEW_LEADS))
            .await;
        assert!(matches!(result, Err(AppError::Unauthenticated(_))));
    }

    #[tokio::test]
    async fn test_deleted_user_is_not_found() {
        let mut mock = MockUserRepository::new();
        mock.expect_find_by_id().with(eq(1)).returning(|_| Ok(None));

        let authz = engine(mock);
        let result = authz
            .authorize(&token_for(1), &Requirement::permission(perms::VIEW_LEADS))
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_inactive_user_denied() {
        let mut mock = MockUserRepository::new();
        mock.expect_find_by_id().with(eq(1)).returning(|_| {
            Ok(Some(User {
                is_active: false,
                ..active_user(1)
            }))
        });

        let authz = engine(mock);
        let result = authz
            .authorize(&token_for(1), &Requirement::permission(perms::VIEW_LEADS))
            .await;
        assert!(matches!(result, Err(AppError::Inactive)));
    }

    #[tokio::test]
    async fn test_user_with_no_roles_has_no_permissions() {
        let mut mock = MockUserRepository::new();
        mock.expect_find_by_id()
            .with(eq(1))
            .returning(|_| Ok(Some(active_user(1))));
        // No role memberships: the store resolves zero permissions.
        mock.expect_find_permissions()
            .with(eq(1))
            .returning(|_| Ok(vec![]));

        let authz = engine(mock);
        let result = authz
            .authorize(&token_for(1), &Requirement::permission(perms::VIEW_DASHBOARD))
            .await;
        assert!(
            matches!(result, Err(AppError::InsufficientPrivilege(ref c)) if c == "view_dashboard")
        );
    }

    #[tokio::test]
    async fn test_granted_permission_allows() {
        let mut mock = MockUserRepository::new();
        mock.expect_find_by_id()
            .with(eq(1))
            .returning(|_| Ok(Some(active_user(1))));
        mock.expect_find_permissions()
            .with(eq(1))
            .returning(|_| Ok(vec!["view_leads".to_string()]));

        let authz = engine(mock);
        let user = authz
            .authorize(&token_for(1), &Requirement::permission(perms::VIEW_LEADS))
            .await
            .unwrap();
        assert_eq!(user.id, 1);
    }

    #[tokio::test]
    async fn test_role_requirement_exact_name_match() {
        let mut mock = MockUserRepository::new();
        mock.expect_find_by_id()
            .with(eq(1))
            .returning(|_| Ok(Some(active_user(1))));
        mock.expect_find_roles()
            .with(eq(1))
            .returning(|_| Ok(vec![role("analyst")]));

        let authz = engine(mock);

        let result = authz
            .authorize(&token_for(1), &Requirement::role("superadmin"))
            .await;
        assert!(matches!(result, Err(AppError::InsufficientPrivilege(_))));
    }

    #[tokio::test]
    async fn test_superadmin_role_is_not_a_permission_bypass() {
        // Two-tier model: the role bypasses ownership, never permission checks.
        let mut mock = MockUserRepository::new();
        mock.expect_find_by_id()
            .with(eq(1))
            .returning(|_| Ok(Some(active_user(1))));
        mock.expect_find_permissions()
            .with(eq(1))
            .returning(|_| Ok(vec![]));

        let authz = engine(mock);
        let result = authz
            .authorize(&token_for(1), &Requirement::permission(perms::EXPORT_LEADS))
            .await;
        assert!(matches!(result, Err(AppError::InsufficientPrivilege(_))));
    }

    #[tokio::test]
    async fn test_owner_may_access_own_resource() {
        let authz = engine(MockUserRepository::new());
        // Same id: no role lookup needed.
        authz.check_owner(&active_user(7), 7).await.unwrap();
    }

    #[tokio::test]
    async fn test_non_owner_without_superadmin_forbidden() {
        let mut mock = MockUserRepository::new();
        mock.expect_find_roles()
            .with(eq(7))
            .returning(|_| Ok(vec![role("analyst")]));

        let authz = engine(mock);
        let result = authz.check_owner(&active_user(7), 8).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_superadmin_bypasses_ownership() {
        let mut mock = MockUserRepository::new();
        mock.expect_find_roles()
            .with(eq(7))
            .returning(|_| Ok(vec![role(SUPERADMIN_ROLE)]));

        let authz = engine(mock);
        authz.check_owner(&active_user(7), 8).await.unwrap();
    }

    #[tokio::test]
    async fn test_scope_is_owner_bound_for_regular_users() {
        let mut mock = MockUserRepository::new();
        mock.expect_find_roles().with(eq(7)).returning(|_| Ok(vec![]));

        let authz = engine(mock);
        let scope = authz.scope(&active_user(7)).await.unwrap();
        assert_eq!(scope, OwnerScope::Owner(7));
        assert_eq!(scope.as_filter(), Some(7));
    }

    #[tokio::test]
    async fn test_scope_is_unbounded_for_superadmin() {
        let mut mock = MockUserRepository::new();
        mock.expect_find_roles()
            .with(eq(7))
            .returning(|_| Ok(vec![role(SUPERADMIN_ROLE)]));

        let authz = engine(mock);
        let scope = authz.scope(&active_user(7)).await.unwrap();
        assert_eq!(scope, OwnerScope::All);
        assert_eq!(scope.as_filter(), None);
    }

    #[tokio::test]
    async fn test_authorize_owner_combines_both_gates() {
        let mut mock = MockUserRepository::new();
        mock.expect_find_by_id()
            .with(eq(1))
            .returning(|_| Ok(Some(active_user(1))));
        mock.expect_find_permissions()
            .with(eq(1))
            .returning(|_| Ok(vec!["view_leads".to_string()]));
        mock.expect_find_roles().with(eq(1)).returning(|_| Ok(vec![]));

        let authz = engine(mock);

        // Capability held, but the resource belongs to user 2.
        let result = authz
            .authorize_owner(&token_for(1), &Requirement::permission(perms::VIEW_LEADS), 2)
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_expired_token_rejected_before_any_lookup() {
        let expired_manager = JwtManager::new(JwtConfig {
            secret: "policy-test-secret".to_string(),
            issuer: "https://leadscout.test".to_string(),
            access_token_ttl_secs: -60,
            refresh_token_ttl_secs: 86400,
        });
        let token = expired_manager
            .create_access_token(1, "user1@example.com")
            .unwrap();

        // No expectations on the mock: a store hit would panic the test.
        let authz = engine(MockUserRepository::new());
        let result = authz
            .authorize(&token, &Requirement::permission(perms::VIEW_LEADS))
            .await;
        assert!(matches!(result, Err(AppError::Unauthenticated(_))));
    }
}
