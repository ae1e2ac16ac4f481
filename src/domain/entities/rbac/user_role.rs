//! User ↔ Role 할당 레코드

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::time_utils::{bson_datetime, bson_datetime_opt};

/// (user_id, role_id) 쌍은 유니크합니다.
///
/// `is_active && (expires_at 없음 || expires_at > now)`일 때만 유효합니다.
/// 만료된 레코드는 이력으로 남지만 권한 검사에서는 항상 거짓입니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRole {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub role_id: String,
    #[serde(default)]
    pub assigned_by: Option<String>,
    #[serde(with = "bson_datetime")]
    pub assigned_at: DateTime<Utc>,
    #[serde(default, with = "bson_datetime_opt")]
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl UserRole {
    pub fn new(
        user_id: &str,
        role_id: &str,
        assigned_by: Option<String>,
        expires_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            role_id: role_id.to_string(),
            assigned_by,
            assigned_at: now,
            expires_at,
            is_active: true,
        }
    }

    pub fn is_effective(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.is_none_or(|expires_at| expires_at > now)
    }
}
