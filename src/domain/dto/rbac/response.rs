//! RBAC 응답 DTO

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::rbac::{Permission, Role, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Role> for RoleResponse {
    fn from(role: Role) -> Self {
        Self {
            id: role.id,
            name: role.name,
            description: role.description,
            is_active: role.is_active,
            version: role.version,
            created_at: role.created_at,
            updated_at: role.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionResponse {
    pub id: String,
    pub name: String,
    pub resource: String,
    pub action: String,
    pub description: Option<String>,
    pub is_active: bool,
}

impl From<Permission> for PermissionResponse {
    fn from(permission: Permission) -> Self {
        Self {
            id: permission.id,
            name: permission.name,
            resource: permission.resource,
            action: permission.action,
            description: permission.description,
            is_active: permission.is_active,
        }
    }
}

/// 사용자-역할 할당 이력 항목
///
/// `is_effective`는 응답 생성 시점 기준입니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRoleResponse {
    pub id: String,
    pub user_id: String,
    pub role_id: String,
    pub role_name: Option<String>,
    pub assigned_by: Option<String>,
    pub assigned_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub is_effective: bool,
}

impl UserRoleResponse {
    pub fn new(assignment: UserRole, role_name: Option<String>, now: DateTime<Utc>) -> Self {
        let is_effective = assignment.is_effective(now);
        Self {
            id: assignment.id,
            user_id: assignment.user_id,
            role_id: assignment.role_id,
            role_name,
            assigned_by: assignment.assigned_by,
            assigned_at: assignment.assigned_at,
            expires_at: assignment.expires_at,
            is_active: assignment.is_active,
            is_effective,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupResponse {
    pub deactivated: u64,
}
