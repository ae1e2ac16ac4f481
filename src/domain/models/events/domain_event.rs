//! 도메인 이벤트
//!
//! 상태 변경이 커밋된 뒤 발행되는 사실 기록입니다.
//! 소비자는 `event_id`를 메시지 ID로 사용해 인박스에서 중복을 제거합니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "user.registered")]
    UserRegistered,
    #[serde(rename = "user.logged_in")]
    UserLoggedIn,
    #[serde(rename = "user.logged_out")]
    UserLoggedOut,
    #[serde(rename = "user.password_changed")]
    PasswordChanged,
    #[serde(rename = "user.password_reset")]
    PasswordReset,
    #[serde(rename = "user.email_verified")]
    EmailVerified,
    #[serde(rename = "user.deactivated")]
    UserDeactivated,
    #[serde(rename = "role.assigned")]
    RoleAssigned,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::UserRegistered => "user.registered",
            EventType::UserLoggedIn => "user.logged_in",
            EventType::UserLoggedOut => "user.logged_out",
            EventType::PasswordChanged => "user.password_changed",
            EventType::PasswordReset => "user.password_reset",
            EventType::EmailVerified => "user.email_verified",
            EventType::UserDeactivated => "user.deactivated",
            EventType::RoleAssigned => "role.assigned",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    pub event_id: Uuid,
    pub event_type: EventType,
    pub user_id: String,
    pub occurred_at: DateTime<Utc>,
    #[serde(default)]
    pub payload: Value,
}

impl DomainEvent {
    pub fn new(event_type: EventType, user_id: &str, occurred_at: DateTime<Utc>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type,
            user_id: user_id.to_string(),
            occurred_at,
            payload: Value::Null,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }
}
