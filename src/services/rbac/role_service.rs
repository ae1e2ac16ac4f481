//! # 역할/권한 관리 서비스
//!
//! 관리자 API 뒤에서 역할, 권한, 권한 부여, 사용자 역할 할당을 관리합니다.
//! 저장소는 유니크 제약과 원자성을 보장하고, 이 서비스는 입력 정규화와
//! 참조 무결성(존재하지 않는 역할·권한·사용자 거부)을 담당합니다.
//!
//! ## 기본 시드
//!
//! | 역할 | 권한 |
//! |------|------|
//! | `ADMIN` | 모든 기본 권한 |
//! | `MODERATOR` | `users:read`, `users:list`, `users:update` |
//! | `USER` | 없음 |
//!
//! 기본 권한: `users:{create,read,update,delete,list,manage}`, `roles:{read,manage}`,
//! `permissions:{read,manage}`

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde_json::json;
use validator::Validate;

use crate::core::errors::AppError;
use crate::domain::dto::rbac::{
    AssignRoleRequest, CreatePermissionRequest, CreateRoleRequest, SyncRolePermissionsRequest,
    UpdatePermissionRequest, UpdateRoleRequest, UserRoleResponse,
};
use crate::domain::entities::rbac::permission::compose_name;
use crate::domain::entities::rbac::role::{ADMIN_ROLE, MODERATOR_ROLE, USER_ROLE};
use crate::domain::entities::rbac::{Permission, Role, RolePermission, UserRole};
use crate::domain::models::events::{DomainEvent, EventType};
use crate::repositories::rbac::RbacStore;
use crate::repositories::users::CredentialStore;
use crate::services::notifications::{publish_or_log, EventPublisher};
use crate::utils::clock::Clock;
use crate::utils::string_utils::normalize_email;

/// 기동 시 보장되는 기본 권한
pub const DEFAULT_PERMISSIONS: [(&str, &str, &str); 10] = [
    ("users", "create", "사용자 생성"),
    ("users", "read", "사용자 조회"),
    ("users", "update", "사용자 수정"),
    ("users", "delete", "사용자 삭제"),
    ("users", "list", "사용자 목록"),
    ("users", "manage", "사용자 역할 관리"),
    ("roles", "read", "역할 조회"),
    ("roles", "manage", "역할 관리"),
    ("permissions", "read", "권한 조회"),
    ("permissions", "manage", "권한 관리"),
];

const MODERATOR_PERMISSIONS: [&str; 3] = ["users:read", "users:list", "users:update"];

fn role_not_found() -> AppError {
    AppError::NotFound("역할을 찾을 수 없습니다".to_string())
}

fn permission_not_found() -> AppError {
    AppError::NotFound("권한을 찾을 수 없습니다".to_string())
}

pub struct RoleService {
    rbac: Arc<dyn RbacStore>,
    users: Arc<dyn CredentialStore>,
    events: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl RoleService {
    pub fn new(
        rbac: Arc<dyn RbacStore>,
        users: Arc<dyn CredentialStore>,
        events: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            rbac,
            users,
            events,
            clock,
        }
    }

    // ----- 역할 -----

    pub async fn create_role(&self, request: CreateRoleRequest) -> Result<Role, AppError> {
        request.validate()?;
        let role = Role::new(&request.name, request.description, self.clock.now())?;
        let created = self.rbac.create_role(role).await?;
        log::info!("역할 생성: {} ({})", created.name, created.id);
        Ok(created)
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        self.rbac.list_roles().await
    }

    pub async fn get_role(&self, role_id: &str) -> Result<Role, AppError> {
        self.rbac.find_role_by_id(role_id).await?.ok_or_else(role_not_found)
    }

    pub async fn update_role(&self, role_id: &str, request: UpdateRoleRequest) -> Result<Role, AppError> {
        request.validate()?;
        let mut role = self.get_role(role_id).await?;

        if let Some(name) = request.name {
            let name = Role::normalize_name(&name);
            Role::validate_name(&name)?;
            role.name = name;
        }
        if request.description.is_some() {
            role.description = request.description;
        }
        if let Some(is_active) = request.is_active {
            role.is_active = is_active;
        }
        role.version = request.version;

        self.rbac.update_role(role, self.clock.now()).await
    }

    /// 역할을 삭제합니다. 이 역할의 부여·할당 레코드는 모두 비활성화됩니다.
    pub async fn delete_role(&self, role_id: &str) -> Result<(), AppError> {
        if !self.rbac.delete_role(role_id).await? {
            return Err(role_not_found());
        }
        log::info!("역할 삭제: {}", role_id);
        Ok(())
    }

    // ----- 권한 -----

    pub async fn create_permission(&self, request: CreatePermissionRequest) -> Result<Permission, AppError> {
        request.validate()?;
        let permission = Permission::new(&request.resource, &request.action, request.description, self.clock.now())?;
        self.rbac.create_permission(permission).await
    }

    pub async fn list_permissions(&self) -> Result<Vec<Permission>, AppError> {
        self.rbac.list_permissions().await
    }

    pub async fn update_permission(
        &self,
        permission_id: &str,
        request: UpdatePermissionRequest,
    ) -> Result<Permission, AppError> {
        request.validate()?;
        let mut permission = self
            .rbac
            .find_permission_by_id(permission_id)
            .await?
            .ok_or_else(permission_not_found)?;

        if request.description.is_some() {
            permission.description = request.description;
        }
        if let Some(is_active) = request.is_active {
            permission.is_active = is_active;
        }

        self.rbac.update_permission(permission, self.clock.now()).await
    }

    pub async fn delete_permission(&self, permission_id: &str) -> Result<(), AppError> {
        if !self.rbac.delete_permission(permission_id).await? {
            return Err(permission_not_found());
        }
        Ok(())
    }

    // ----- 역할-권한 부여 -----

    pub async fn role_permissions(&self, role_id: &str) -> Result<Vec<Permission>, AppError> {
        self.get_role(role_id).await?;
        self.rbac.role_permissions(role_id).await
    }

    pub async fn grant_permission(
        &self,
        role_id: &str,
        permission_id: &str,
        granted_by: Option<&str>,
    ) -> Result<RolePermission, AppError> {
        self.get_role(role_id).await?;
        self.rbac
            .find_permission_by_id(permission_id)
            .await?
            .ok_or_else(permission_not_found)?;

        self.rbac
            .grant_permission(role_id, permission_id, granted_by, self.clock.now())
            .await
    }

    /// 활성 부여를 회수합니다. 회수할 것이 없으면 `false`
    pub async fn revoke_permission(&self, role_id: &str, permission_id: &str) -> Result<bool, AppError> {
        self.get_role(role_id).await?;
        self.rbac.revoke_permission(role_id, permission_id).await
    }

    /// 역할의 권한 집합을 요청과 정확히 같게 맞추고 결과 권한 목록을 반환합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::ValidationError` - 존재하지 않는 권한 ID가 포함된 경우 (아무것도 변경하지 않음)
    pub async fn sync_role_permissions(
        &self,
        role_id: &str,
        request: SyncRolePermissionsRequest,
        granted_by: Option<&str>,
    ) -> Result<Vec<Permission>, AppError> {
        request.validate()?;
        self.get_role(role_id).await?;

        let wanted: Vec<String> = request
            .permission_ids
            .iter()
            .map(|id| id.trim().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let found = self.rbac.find_permissions_by_ids(&wanted).await?;
        if found.len() != wanted.len() {
            let known: BTreeSet<&str> = found.iter().map(|p| p.id.as_str()).collect();
            let missing: Vec<&str> = wanted
                .iter()
                .map(String::as_str)
                .filter(|id| !known.contains(id))
                .collect();
            return Err(AppError::ValidationError(format!(
                "존재하지 않는 권한 ID: {}",
                missing.join(", ")
            )));
        }

        self.rbac
            .sync_role_permissions(role_id, &wanted, granted_by, self.clock.now())
            .await?;
        self.rbac.role_permissions(role_id).await
    }

    // ----- 사용자-역할 할당 -----

    /// 역할을 할당합니다. 같은 쌍을 다시 할당하면 만료 시각만 갱신됩니다.
    pub async fn assign_role(
        &self,
        user_id: &str,
        request: AssignRoleRequest,
        assigned_by: Option<&str>,
    ) -> Result<UserRole, AppError> {
        request.validate()?;
        let now = self.clock.now();

        if request.expires_at.is_some_and(|expires_at| expires_at <= now) {
            return Err(AppError::ValidationError("만료 시각은 현재 이후여야 합니다".to_string()));
        }

        self.users.get_by_id(user_id).await?;
        let role = self.get_role(&request.role_id).await?;
        if !role.is_active {
            return Err(AppError::ValidationError(format!("비활성 역할은 할당할 수 없습니다: {}", role.name)));
        }

        let assignment = self
            .rbac
            .assign_role(user_id, &role.id, assigned_by, request.expires_at, now)
            .await?;

        let event = DomainEvent::new(EventType::RoleAssigned, user_id, now).with_payload(json!({
            "role_id": role.id,
            "role_name": role.name,
            "assigned_by": assigned_by,
            "expires_at": request.expires_at,
        }));
        publish_or_log(self.events.as_ref(), event).await;

        Ok(assignment)
    }

    pub async fn unassign_role(&self, user_id: &str, role_id: &str) -> Result<bool, AppError> {
        self.rbac.unassign_role(user_id, role_id).await
    }

    /// 만료·비활성 레코드를 포함한 할당 이력 (역할 이름 포함)
    pub async fn user_role_history(&self, user_id: &str) -> Result<Vec<UserRoleResponse>, AppError> {
        let history = self.rbac.user_role_history(user_id).await?;
        let names: HashMap<String, String> = self
            .rbac
            .list_roles()
            .await?
            .into_iter()
            .map(|role| (role.id, role.name))
            .collect();
        let now = self.clock.now();

        Ok(history
            .into_iter()
            .map(|assignment| {
                let role_name = names.get(&assignment.role_id).cloned();
                UserRoleResponse::new(assignment, role_name, now)
            })
            .collect())
    }

    pub async fn cleanup_expired(&self) -> Result<u64, AppError> {
        let count = self.rbac.cleanup_expired(self.clock.now()).await?;
        if count > 0 {
            log::info!("만료된 역할 할당 {}건 비활성화", count);
        }
        Ok(count)
    }

    /// 신규 사용자에게 `USER` 역할을 부여합니다. 역할이 없으면 아무것도 하지 않습니다.
    pub async fn assign_default_role(&self, user_id: &str) -> Result<(), AppError> {
        if let Some(role) = self.rbac.find_role_by_name(USER_ROLE).await? {
            if role.is_active {
                self.rbac
                    .assign_role(user_id, &role.id, None, None, self.clock.now())
                    .await?;
            }
        }
        Ok(())
    }

    // ----- 시드 -----

    /// 기본 권한과 역할을 없을 때만 생성합니다. 여러 번 실행해도 결과가 같습니다.
    pub async fn seed_defaults(&self) -> Result<(), AppError> {
        let now = self.clock.now();

        let mut by_name: HashMap<String, Permission> = HashMap::new();
        for (resource, action, description) in DEFAULT_PERMISSIONS {
            let name = compose_name(resource, action);
            let permission = match self.rbac.find_permission_by_name(&name).await? {
                Some(existing) => existing,
                None => {
                    let permission = Permission::new(resource, action, Some(description.to_string()), now)?;
                    self.create_permission_tolerant(permission).await?
                }
            };
            by_name.insert(name, permission);
        }

        let admin = self.ensure_role(ADMIN_ROLE, "시스템 관리자").await?;
        let moderator = self.ensure_role(MODERATOR_ROLE, "사용자 관리 보조").await?;
        self.ensure_role(USER_ROLE, "일반 사용자").await?;

        for permission in by_name.values() {
            self.rbac.grant_permission(&admin.id, &permission.id, None, now).await?;
        }
        for name in MODERATOR_PERMISSIONS {
            if let Some(permission) = by_name.get(name) {
                self.rbac.grant_permission(&moderator.id, &permission.id, None, now).await?;
            }
        }

        log::info!("🌱 기본 역할/권한 시드 완료 (권한 {}개)", by_name.len());
        Ok(())
    }

    async fn ensure_role(&self, name: &str, description: &str) -> Result<Role, AppError> {
        if let Some(role) = self.rbac.find_role_by_name(name).await? {
            return Ok(role);
        }
        let role = Role::new(name, Some(description.to_string()), self.clock.now())?;
        match self.rbac.create_role(role).await {
            Ok(role) => Ok(role),
            // 다른 인스턴스가 동시에 시드한 경우
            Err(AppError::ConflictError(_)) => self.rbac.find_role_by_name(name).await?.ok_or_else(role_not_found),
            Err(e) => Err(e),
        }
    }

    async fn create_permission_tolerant(&self, permission: Permission) -> Result<Permission, AppError> {
        let name = permission.name.clone();
        match self.rbac.create_permission(permission).await {
            Ok(permission) => Ok(permission),
            Err(AppError::ConflictError(_)) => self
                .rbac
                .find_permission_by_name(&name)
                .await?
                .ok_or_else(permission_not_found),
            Err(e) => Err(e),
        }
    }

    /// 지정된 기존 사용자에게 `ADMIN` 역할을 부여합니다.
    pub async fn bootstrap_admin(&self, email: &str) -> Result<bool, AppError> {
        let email = normalize_email(email);
        let Some(user) = self.users.find_by_email(&email).await? else {
            log::warn!("BOOTSTRAP_ADMIN_EMAIL 사용자를 찾을 수 없습니다: {}", email);
            return Ok(false);
        };
        let admin = self.rbac.find_role_by_name(ADMIN_ROLE).await?.ok_or_else(role_not_found)?;

        self.rbac
            .assign_role(&user.id, &admin.id, None, None, self.clock.now())
            .await?;
        log::info!("👑 관리자 역할 부여: {}", email);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::users::user::User;
    use crate::repositories::inbox::InMemoryInboxStore;
    use crate::repositories::rbac::InMemoryRbacStore;
    use crate::repositories::users::InMemoryCredentialStore;
    use crate::services::inbox::InboxService;
    use crate::services::notifications::InProcessEventBus;
    use crate::services::rbac::AuthorizationService;
    use crate::utils::clock::ManualClock;
    use chrono::{Duration, Utc};

    struct Fixture {
        roles: RoleService,
        authz: AuthorizationService,
        users: Arc<InMemoryCredentialStore>,
        clock: Arc<ManualClock>,
    }

    async fn fixture() -> Fixture {
        let rbac = Arc::new(InMemoryRbacStore::new());
        let users = Arc::new(InMemoryCredentialStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let inbox = Arc::new(InboxService::new(
            Arc::new(InMemoryInboxStore::new()),
            clock.clone(),
            Duration::hours(1),
        ));
        let events = Arc::new(InProcessEventBus::new(inbox));

        let roles = RoleService::new(rbac.clone(), users.clone(), events, clock.clone());
        let authz = AuthorizationService::new(rbac, clock.clone());
        roles.seed_defaults().await.unwrap();
        Fixture {
            roles,
            authz,
            users,
            clock,
        }
    }

    async fn user(fx: &Fixture, email: &str) -> User {
        fx.users
            .create(User::new_local(email, "U".into(), None, "hash".into(), fx.clock.now()))
            .await
            .unwrap()
    }

    fn role_request(name: &str) -> CreateRoleRequest {
        CreateRoleRequest {
            name: name.to_string(),
            description: None,
        }
    }

    #[actix_web::test]
    async fn test_seed_is_idempotent_and_grants_admin_everything() {
        let fx = fixture().await;
        fx.roles.seed_defaults().await.unwrap();

        assert_eq!(fx.roles.list_permissions().await.unwrap().len(), DEFAULT_PERMISSIONS.len());
        assert_eq!(fx.roles.list_roles().await.unwrap().len(), 3);

        let admin = user(&fx, "root@x.io").await;
        assert!(fx.roles.bootstrap_admin(" Root@X.io ").await.unwrap());
        assert!(fx.authz.is_admin(&admin.id).await.unwrap());
        assert!(fx.authz.has_permission(&admin.id, "permissions", "manage").await.unwrap());
        assert!(!fx.roles.bootstrap_admin("nobody@x.io").await.unwrap());
    }

    #[actix_web::test]
    async fn test_role_names_are_normalized_and_unique() {
        let fx = fixture().await;
        let created = fx.roles.create_role(role_request("editor")).await.unwrap();
        assert_eq!(created.name, "EDITOR");

        let duplicate = fx.roles.create_role(role_request(" EDITOR ")).await.unwrap_err();
        assert!(matches!(duplicate, AppError::ConflictError(_)));
        assert!(matches!(
            fx.roles.create_role(role_request("bad-name")).await.unwrap_err(),
            AppError::ValidationError(_)
        ));
    }

    #[actix_web::test]
    async fn test_update_role_uses_optimistic_version() {
        let fx = fixture().await;
        let role = fx.roles.create_role(role_request("editor")).await.unwrap();

        let update = |version| UpdateRoleRequest {
            name: Some("writer".into()),
            description: None,
            is_active: None,
            version,
        };
        let updated = fx.roles.update_role(&role.id, update(1)).await.unwrap();
        assert_eq!(updated.name, "WRITER");
        assert_eq!(updated.version, 2);
        assert!(matches!(
            fx.roles.update_role(&role.id, update(1)).await.unwrap_err(),
            AppError::ConflictError(_)
        ));
    }

    #[actix_web::test]
    async fn test_sync_converges_and_rejects_unknown_ids() {
        let fx = fixture().await;
        let role = fx.roles.create_role(role_request("editor")).await.unwrap();
        let all = fx.roles.list_permissions().await.unwrap();
        let ids = |names: &[&str]| -> Vec<String> {
            all.iter()
                .filter(|p| names.contains(&p.name.as_str()))
                .map(|p| p.id.clone())
                .collect()
        };

        fx.roles
            .grant_permission(&role.id, &ids(&["roles:read"])[0], Some("admin"))
            .await
            .unwrap();

        let request = SyncRolePermissionsRequest {
            permission_ids: ids(&["users:read", "users:list"]),
        };
        let synced = fx.roles.sync_role_permissions(&role.id, request.clone(), None).await.unwrap();
        let again = fx.roles.sync_role_permissions(&role.id, request, None).await.unwrap();
        let names: Vec<&str> = synced.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["users:list", "users:read"]);
        assert_eq!(again.len(), 2);

        let mut bad = ids(&["users:read"]);
        bad.push("missing-id".into());
        let error = fx
            .roles
            .sync_role_permissions(&role.id, SyncRolePermissionsRequest { permission_ids: bad }, None)
            .await
            .unwrap_err();
        assert!(matches!(error, AppError::ValidationError(_)));
        assert_eq!(fx.roles.role_permissions(&role.id).await.unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn test_assign_role_validates_references_and_expiry() {
        let fx = fixture().await;
        let member = user(&fx, "m@x.io").await;
        let role = fx.roles.create_role(role_request("editor")).await.unwrap();
        let now = fx.clock.now();

        let assign = |role_id: &str, expires_at| AssignRoleRequest {
            role_id: role_id.to_string(),
            expires_at,
        };

        assert!(matches!(
            fx.roles.assign_role("ghost", assign(&role.id, None), None).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            fx.roles.assign_role(&member.id, assign("ghost", None), None).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            fx.roles
                .assign_role(&member.id, assign(&role.id, Some(now)), None)
                .await
                .unwrap_err(),
            AppError::ValidationError(_)
        ));

        fx.roles
            .assign_role(&member.id, assign(&role.id, Some(now + Duration::hours(1))), Some("admin"))
            .await
            .unwrap();
        let refreshed = fx
            .roles
            .assign_role(&member.id, assign(&role.id, Some(now + Duration::hours(2))), Some("admin"))
            .await
            .unwrap();
        assert_eq!(refreshed.expires_at, Some(now + Duration::hours(2)));

        let history = fx.roles.user_role_history(&member.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role_name.as_deref(), Some("EDITOR"));
        assert!(history[0].is_effective);

        fx.clock.advance(Duration::hours(3));
        assert_eq!(fx.roles.cleanup_expired().await.unwrap(), 1);
        let history = fx.roles.user_role_history(&member.id).await.unwrap();
        assert!(!history[0].is_effective);
    }

    #[actix_web::test]
    async fn test_deleting_role_removes_effective_access() {
        let fx = fixture().await;
        let member = user(&fx, "m@x.io").await;
        let role = fx.roles.create_role(role_request("editor")).await.unwrap();
        let permission = fx
            .roles
            .create_permission(CreatePermissionRequest {
                resource: "articles".into(),
                action: "update".into(),
                description: None,
            })
            .await
            .unwrap();

        fx.roles.grant_permission(&role.id, &permission.id, None).await.unwrap();
        fx.roles
            .assign_role(&member.id, AssignRoleRequest { role_id: role.id.clone(), expires_at: None }, None)
            .await
            .unwrap();
        assert!(fx.authz.has_permission(&member.id, "articles", "update").await.unwrap());

        fx.roles.delete_role(&role.id).await.unwrap();
        assert!(!fx.authz.has_permission(&member.id, "articles", "update").await.unwrap());
        assert!(matches!(fx.roles.delete_role(&role.id).await.unwrap_err(), AppError::NotFound(_)));
    }

    #[actix_web::test]
    async fn test_default_role_assignment() {
        let fx = fixture().await;
        let member = user(&fx, "m@x.io").await;

        fx.roles.assign_default_role(&member.id).await.unwrap();
        assert!(fx.authz.has_role(&member.id, USER_ROLE).await.unwrap());
    }
}
