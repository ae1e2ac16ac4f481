//! RBAC 관리 요청 DTO

use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::utils::string_utils::deserialize_optional_string;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRoleRequest {
    #[validate(length(min = 2, max = 50, message = "역할 이름은 2-50자여야 합니다"))]
    pub name: String,

    #[serde(default, deserialize_with = "deserialize_optional_string")]
    #[validate(length(max = 500, message = "설명은 500자를 넘을 수 없습니다"))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateRoleRequest {
    #[validate(length(min = 2, max = 50, message = "역할 이름은 2-50자여야 합니다"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "deserialize_optional_string")]
    #[validate(length(max = 500, message = "설명은 500자를 넘을 수 없습니다"))]
    pub description: Option<String>,

    pub is_active: Option<bool>,

    #[validate(range(min = 1, message = "버전은 1 이상이어야 합니다"))]
    pub version: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePermissionRequest {
    #[validate(length(min = 2, max = 50, message = "리소스 이름은 2-50자여야 합니다"))]
    pub resource: String,

    #[validate(length(min = 1, max = 50, message = "동작 이름은 1-50자여야 합니다"))]
    pub action: String,

    #[serde(default, deserialize_with = "deserialize_optional_string")]
    #[validate(length(max = 500, message = "설명은 500자를 넘을 수 없습니다"))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdatePermissionRequest {
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    #[validate(length(max = 500, message = "설명은 500자를 넘을 수 없습니다"))]
    pub description: Option<String>,

    pub is_active: Option<bool>,
}

/// 역할의 권한 집합을 주어진 목록으로 교체
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SyncRolePermissionsRequest {
    #[validate(length(max = 500, message = "한 번에 최대 500개의 권한을 지정할 수 있습니다"))]
    pub permission_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AssignRoleRequest {
    #[validate(length(min = 1, message = "역할 ID가 필요합니다"))]
    pub role_id: String,

    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CheckPermissionsRequest {
    #[validate(length(min = 1, max = 100, message = "1-100개의 권한 이름이 필요합니다"))]
    pub permissions: Vec<String>,
}
