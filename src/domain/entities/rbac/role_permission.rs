//! Role ↔ Permission 부여 레코드

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::time_utils::bson_datetime;

/// (role_id, permission_id) 쌍은 유니크합니다. 비활성 레코드는 권한 계산에서 무시됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolePermission {
    #[serde(rename = "_id")]
    pub id: String,
    pub role_id: String,
    pub permission_id: String,
    #[serde(default)]
    pub granted_by: Option<String>,
    #[serde(with = "bson_datetime")]
    pub granted_at: DateTime<Utc>,
    pub is_active: bool,
}

impl RolePermission {
    pub fn new(role_id: &str, permission_id: &str, granted_by: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role_id: role_id.to_string(),
            permission_id: permission_id.to_string(),
            granted_by,
            granted_at: now,
            is_active: true,
        }
    }
}
