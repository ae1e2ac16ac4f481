//! # Authorizer
//!
//! "사용자 U가 지금 권한 P / 역할 R을 가지고 있는가"에 답합니다.
//!
//! 모든 판단은 요청 시점의 저장소 상태와 [`Clock`] 기준이며 캐시하지 않습니다.
//! 권한 부여를 회수하면 같은 요청 주기 안에서 바로 `false`가 됩니다.
//!
//! 권한 이름은 `resource:action` 정확히 일치로 비교합니다. `manage`가 다른 동작을
//! 암묵적으로 포함하지는 않습니다.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::core::errors::AppError;
use crate::domain::entities::rbac::permission::compose_name;
use crate::domain::entities::rbac::role::{ADMIN_ROLE, MODERATOR_ROLE};
use crate::domain::entities::rbac::{Permission, Role};
use crate::repositories::rbac::RbacStore;
use crate::utils::clock::Clock;

pub struct AuthorizationService {
    rbac: Arc<dyn RbacStore>,
    clock: Arc<dyn Clock>,
}

impl AuthorizationService {
    pub fn new(rbac: Arc<dyn RbacStore>, clock: Arc<dyn Clock>) -> Self {
        Self { rbac, clock }
    }

    pub async fn has_permission(&self, user_id: &str, resource: &str, action: &str) -> Result<bool, AppError> {
        self.has_permission_by_name(user_id, &compose_name(resource, action)).await
    }

    pub async fn has_permission_by_name(&self, user_id: &str, name: &str) -> Result<bool, AppError> {
        let wanted = name.trim().to_lowercase();
        let permissions = self.effective_permissions(user_id).await?;
        Ok(permissions.iter().any(|p| p.name == wanted))
    }

    /// 유효 사슬로 도달 가능한 활성 권한 (중복 없음)
    pub async fn effective_permissions(&self, user_id: &str) -> Result<Vec<Permission>, AppError> {
        self.rbac.effective_permissions(user_id, self.clock.now()).await
    }

    pub async fn effective_roles(&self, user_id: &str) -> Result<Vec<Role>, AppError> {
        self.rbac.effective_roles(user_id, self.clock.now()).await
    }

    async fn role_names(&self, user_id: &str) -> Result<HashSet<String>, AppError> {
        Ok(self
            .effective_roles(user_id)
            .await?
            .into_iter()
            .map(|role| role.name)
            .collect())
    }

    pub async fn has_role(&self, user_id: &str, role_name: &str) -> Result<bool, AppError> {
        Ok(self.role_names(user_id).await?.contains(&Role::normalize_name(role_name)))
    }

    pub async fn has_any_role<S: AsRef<str>>(&self, user_id: &str, role_names: &[S]) -> Result<bool, AppError> {
        let held = self.role_names(user_id).await?;
        Ok(role_names
            .iter()
            .any(|name| held.contains(&Role::normalize_name(name.as_ref()))))
    }

    pub async fn has_all_roles<S: AsRef<str>>(&self, user_id: &str, role_names: &[S]) -> Result<bool, AppError> {
        let held = self.role_names(user_id).await?;
        Ok(role_names
            .iter()
            .all(|name| held.contains(&Role::normalize_name(name.as_ref()))))
    }

    pub async fn is_admin(&self, user_id: &str) -> Result<bool, AppError> {
        self.has_role(user_id, ADMIN_ROLE).await
    }

    pub async fn is_moderator(&self, user_id: &str) -> Result<bool, AppError> {
        self.has_any_role(user_id, &[ADMIN_ROLE, MODERATOR_ROLE]).await
    }

    /// 여러 권한을 한 번의 저장소 질의로 검사합니다.
    pub async fn check_multiple_permissions(
        &self,
        user_id: &str,
        names: &[String],
    ) -> Result<HashMap<String, bool>, AppError> {
        let held: HashSet<String> = self
            .effective_permissions(user_id)
            .await?
            .into_iter()
            .map(|p| p.name)
            .collect();

        Ok(names
            .iter()
            .map(|name| {
                let granted = held.contains(&name.trim().to_lowercase());
                (name.clone(), granted)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::rbac::InMemoryRbacStore;
    use crate::utils::clock::ManualClock;
    use chrono::{Duration, Utc};

    struct Fixture {
        authz: AuthorizationService,
        rbac: Arc<InMemoryRbacStore>,
        clock: Arc<ManualClock>,
        editor: Role,
        update: Permission,
    }

    async fn fixture() -> Fixture {
        let rbac = Arc::new(InMemoryRbacStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let now = clock.now();

        let editor = rbac.create_role(Role::new("editor", None, now).unwrap()).await.unwrap();
        let update = rbac
            .create_permission(Permission::new("articles", "update", None, now).unwrap())
            .await
            .unwrap();
        rbac.grant_permission(&editor.id, &update.id, None, now).await.unwrap();
        rbac.assign_role("u1", &editor.id, None, None, now).await.unwrap();

        let authz = AuthorizationService::new(rbac.clone(), clock.clone());
        Fixture {
            authz,
            rbac,
            clock,
            editor,
            update,
        }
    }

    #[actix_web::test]
    async fn test_revoking_grant_takes_effect_immediately() {
        let fx = fixture().await;
        assert!(fx.authz.has_permission("u1", "articles", "update").await.unwrap());
        assert!(fx.authz.has_permission_by_name("u1", "articles:update").await.unwrap());

        fx.rbac.revoke_permission(&fx.editor.id, &fx.update.id).await.unwrap();
        assert!(!fx.authz.has_permission("u1", "articles", "update").await.unwrap());
    }

    #[actix_web::test]
    async fn test_permission_matching_is_exact() {
        let fx = fixture().await;
        assert!(!fx.authz.has_permission("u1", "articles", "delete").await.unwrap());
        assert!(!fx.authz.has_permission("u1", "articles", "manage").await.unwrap());
        assert!(!fx.authz.has_permission("u2", "articles", "update").await.unwrap());
    }

    #[actix_web::test]
    async fn test_expired_assignment_denies_everything() {
        let fx = fixture().await;
        let now = fx.clock.now();
        fx.rbac
            .assign_role("u1", &fx.editor.id, None, Some(now + Duration::minutes(10)), now)
            .await
            .unwrap();
        assert!(fx.authz.has_role("u1", "EDITOR").await.unwrap());

        fx.clock.advance(Duration::minutes(10));
        assert!(!fx.authz.has_role("u1", "editor").await.unwrap());
        assert!(!fx.authz.has_permission("u1", "articles", "update").await.unwrap());
        assert_eq!(fx.rbac.user_role_history("u1").await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn test_inactive_role_or_permission_breaks_the_chain() {
        let fx = fixture().await;
        let now = fx.clock.now();

        let mut permission = fx.update.clone();
        permission.is_active = false;
        fx.rbac.update_permission(permission, now).await.unwrap();
        assert!(!fx.authz.has_permission("u1", "articles", "update").await.unwrap());

        let mut permission = fx.rbac.find_permission_by_id(&fx.update.id).await.unwrap().unwrap();
        permission.is_active = true;
        fx.rbac.update_permission(permission, now).await.unwrap();
        assert!(fx.authz.has_permission("u1", "articles", "update").await.unwrap());

        let mut role = fx.editor.clone();
        role.is_active = false;
        fx.rbac.update_role(role, now).await.unwrap();
        assert!(!fx.authz.has_permission("u1", "articles", "update").await.unwrap());
        assert!(!fx.authz.has_role("u1", "EDITOR").await.unwrap());
    }

    #[actix_web::test]
    async fn test_role_shorthands() {
        let fx = fixture().await;
        let now = fx.clock.now();
        let moderator = fx.rbac.create_role(Role::new(MODERATOR_ROLE, None, now).unwrap()).await.unwrap();
        fx.rbac.assign_role("u1", &moderator.id, None, None, now).await.unwrap();

        assert!(fx.authz.is_moderator("u1").await.unwrap());
        assert!(!fx.authz.is_admin("u1").await.unwrap());
        assert!(fx.authz.has_all_roles("u1", &["editor", "moderator"]).await.unwrap());
        assert!(!fx.authz.has_all_roles("u1", &["editor", "admin"]).await.unwrap());
        assert!(fx.authz.has_any_role("u1", &["admin", "editor"]).await.unwrap());
    }

    #[actix_web::test]
    async fn test_check_multiple_permissions() {
        let fx = fixture().await;
        let result = fx
            .authz
            .check_multiple_permissions("u1", &["articles:update".to_string(), "articles:delete".to_string()])
            .await
            .unwrap();

        assert_eq!(result.get("articles:update"), Some(&true));
        assert_eq!(result.get("articles:delete"), Some(&false));
    }
}
