//! Permission Entity
//!
//! 권한 이름은 항상 `<resource>:<action>` 입니다.
//! `resource`는 `[a-z][a-z0-9_]{1,49}`, `action`은 표준 동작이거나
//! 표준 동작에 `_접미사`를 붙인 확장 동작(`read_own`, `manage_all` 등)입니다.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::errors::AppError;
use crate::utils::time_utils::bson_datetime;

/// 표준 동작 집합
pub const STANDARD_ACTIONS: [&str; 11] = [
    "create", "read", "update", "delete", "list", "manage", "execute", "view", "edit", "publish", "approve",
];

static RESOURCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]{1,49}$").unwrap_or_else(|e| panic!("invalid resource regex: {e}")));

static ACTION_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(_[a-z0-9]+)*$").unwrap_or_else(|e| panic!("invalid action regex: {e}")));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    #[serde(rename = "_id")]
    pub id: String,
    /// `resource:action`
    pub name: String,
    pub resource: String,
    pub action: String,
    #[serde(default)]
    pub description: Option<String>,
    pub is_active: bool,
    #[serde(with = "bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Permission {
    pub fn new(
        resource: &str,
        action: &str,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, AppError> {
        let resource = resource.trim().to_lowercase();
        let action = action.trim().to_lowercase();
        validate_resource(&resource)?;
        validate_action(&action)?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name: compose_name(&resource, &action),
            resource,
            action,
            description,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }
}

pub fn compose_name(resource: &str, action: &str) -> String {
    format!("{}:{}", resource, action)
}

/// "articles:update" → ("articles", "update")
pub fn parse_name(name: &str) -> Result<(String, String), AppError> {
    let name = name.trim().to_lowercase();
    let Some((resource, action)) = name.split_once(':') else {
        return Err(AppError::ValidationError(format!(
            "권한 이름은 resource:action 형식이어야 합니다: {}",
            name
        )));
    };
    validate_resource(resource)?;
    validate_action(action)?;
    Ok((resource.to_string(), action.to_string()))
}

pub fn validate_resource(resource: &str) -> Result<(), AppError> {
    if RESOURCE_RE.is_match(resource) {
        Ok(())
    } else {
        Err(AppError::ValidationError(format!("유효하지 않은 리소스 이름입니다: {}", resource)))
    }
}

pub fn is_valid_action(action: &str) -> bool {
    STANDARD_ACTIONS.iter().any(|standard| {
        action == *standard
            || action
                .strip_prefix(standard)
                .and_then(|rest| rest.strip_prefix('_'))
                .is_some_and(|suffix| ACTION_SUFFIX_RE.is_match(suffix))
    })
}

pub fn validate_action(action: &str) -> Result<(), AppError> {
    if is_valid_action(action) {
        Ok(())
    } else {
        Err(AppError::ValidationError(format!("유효하지 않은 동작입니다: {}", action)))
    }
}
