//! Role Entity
//!
//! 역할 이름은 대문자 `[A-Z][A-Z0-9_]{1,49}` 형식이며 전역 유니크입니다.
//! 비활성화는 되돌릴 수 있고, 비활성 역할은 권한 계산에서 제외됩니다.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::errors::AppError;
use crate::utils::time_utils::bson_datetime;

pub const ADMIN_ROLE: &str = "ADMIN";
pub const MODERATOR_ROLE: &str = "MODERATOR";
pub const USER_ROLE: &str = "USER";

static ROLE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][A-Z0-9_]{1,49}$").unwrap_or_else(|e| panic!("invalid role regex: {e}")));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub is_active: bool,
    pub version: i64,
    #[serde(with = "bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Role {
    /// 이름을 정규화·검증해 새 역할을 만듭니다.
    pub fn new(name: &str, description: Option<String>, now: DateTime<Utc>) -> Result<Self, AppError> {
        let name = Self::normalize_name(name);
        Self::validate_name(&name)?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name,
            description,
            is_active: true,
            version: 1,
            created_at: now,
            updated_at: now,
        })
    }

    /// "admin " → "ADMIN"
    pub fn normalize_name(name: &str) -> String {
        name.trim().to_uppercase()
    }

    pub fn validate_name(name: &str) -> Result<(), AppError> {
        if ROLE_NAME_RE.is_match(name) {
            Ok(())
        } else {
            Err(AppError::ValidationError(format!(
                "역할 이름은 대문자로 시작하는 2-50자의 대문자/숫자/밑줄이어야 합니다: {}",
                name
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_name_rules() {
        assert_eq!(Role::new(" editor ", None, Utc::now()).unwrap().name, "EDITOR");
        assert!(Role::new("CONTENT_MANAGER_2", None, Utc::now()).is_ok());

        assert!(Role::new("A", None, Utc::now()).is_err());
        assert!(Role::new("1ADMIN", None, Utc::now()).is_err());
        assert!(Role::new("ROLE-X", None, Utc::now()).is_err());
        assert!(Role::new(&"A".repeat(51), None, Utc::now()).is_err());
    }
}
