//! # Role/Permission Store
//!
//! 역할, 권한, 역할-권한 부여(RolePermission), 사용자-역할 할당(UserRole)의 저장소 계약입니다.
//!
//! ## 유효(effective) 의미
//!
//! 사용자의 유효 권한은 다음 사슬이 모두 활성일 때만 포함됩니다.
//!
//! ```text
//! UserRole(활성, 미만료) → Role(활성) → RolePermission(활성) → Permission(활성)
//! ```
//!
//! 만료 판단은 항상 호출자가 넘긴 `now` 기준이며, 만료된 할당은 정리 작업이
//! 비활성화하기 전에도 유효 계산에서 제외됩니다.

pub mod memory;
pub mod rbac_repo;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::errors::AppError;
use crate::domain::entities::rbac::{Permission, Role, RolePermission, UserRole};

pub use memory::InMemoryRbacStore;
pub use rbac_repo::RbacRepository;

pub(crate) const ROLE_CONFLICT: &str = "이미 존재하는 역할 이름입니다";
pub(crate) const PERMISSION_CONFLICT: &str = "이미 존재하는 권한입니다";
pub(crate) const ROLE_VERSION_CONFLICT: &str = "다른 요청이 먼저 역할을 변경했습니다";

#[async_trait]
pub trait RbacStore: Send + Sync {
    async fn create_role(&self, role: Role) -> Result<Role, AppError>;
    async fn find_role_by_id(&self, id: &str) -> Result<Option<Role>, AppError>;
    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, AppError>;
    async fn list_roles(&self) -> Result<Vec<Role>, AppError>;

    /// name, description, is_active 갱신. `role.version`이 현재 버전과 같아야 합니다.
    async fn update_role(&self, role: Role, now: DateTime<Utc>) -> Result<Role, AppError>;

    /// 역할을 삭제하고 이를 참조하는 부여/할당 레코드를 모두 비활성화합니다.
    async fn delete_role(&self, id: &str) -> Result<bool, AppError>;

    async fn create_permission(&self, permission: Permission) -> Result<Permission, AppError>;
    async fn find_permission_by_id(&self, id: &str) -> Result<Option<Permission>, AppError>;
    async fn find_permission_by_name(&self, name: &str) -> Result<Option<Permission>, AppError>;
    async fn find_permissions_by_ids(&self, ids: &[String]) -> Result<Vec<Permission>, AppError>;
    async fn list_permissions(&self) -> Result<Vec<Permission>, AppError>;

    /// description, is_active 갱신
    async fn update_permission(&self, permission: Permission, now: DateTime<Utc>) -> Result<Permission, AppError>;

    /// 권한을 삭제하고 이를 참조하는 부여 레코드를 비활성화합니다.
    async fn delete_permission(&self, id: &str) -> Result<bool, AppError>;

    /// 멱등 부여. 이미 활성이면 그대로, 비활성이면 재활성화하고 `granted_by`를 갱신합니다.
    async fn grant_permission(
        &self,
        role_id: &str,
        permission_id: &str,
        granted_by: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<RolePermission, AppError>;

    /// 활성 부여를 비활성화합니다. 변경이 있었으면 `true`
    async fn revoke_permission(&self, role_id: &str, permission_id: &str) -> Result<bool, AppError>;

    /// 역할의 활성 부여 집합을 `permission_ids`와 정확히 같게 만듭니다 (전부 아니면 전무).
    async fn sync_role_permissions(
        &self,
        role_id: &str,
        permission_ids: &[String],
        granted_by: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), AppError>;

    /// 역할에 활성 부여로 연결된 권한 목록
    async fn role_permissions(&self, role_id: &str) -> Result<Vec<Permission>, AppError>;

    /// 멱등 할당. 재할당은 만료 시각을 갱신하고 비활성 레코드를 재활성화합니다.
    async fn assign_role(
        &self,
        user_id: &str,
        role_id: &str,
        assigned_by: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<UserRole, AppError>;

    async fn unassign_role(&self, user_id: &str, role_id: &str) -> Result<bool, AppError>;

    /// 만료·비활성 레코드를 포함한 할당 이력
    async fn user_role_history(&self, user_id: &str) -> Result<Vec<UserRole>, AppError>;

    /// 만료 시각이 지난 활성 할당을 비활성화하고 개수를 반환합니다.
    async fn cleanup_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;

    /// 유효 할당으로 연결된 활성 역할
    async fn effective_roles(&self, user_id: &str, now: DateTime<Utc>) -> Result<Vec<Role>, AppError>;

    /// 유효 사슬로 도달 가능한 활성 권한의 중복 없는 합집합 (저장소 질의 1회)
    async fn effective_permissions(&self, user_id: &str, now: DateTime<Utc>) -> Result<Vec<Permission>, AppError>;

    async fn create_indexes(&self) -> Result<(), AppError> {
        Ok(())
    }
}
