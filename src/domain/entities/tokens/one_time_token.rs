//! One-Time Token Entity
//!
//! 이메일 인증과 비밀번호 재설정에 쓰이는 일회용 토큰입니다.
//! 원문 토큰은 저장하지 않고 SHA-256 해시를 `_id`로 사용합니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::time_utils::{bson_datetime, bson_datetime_opt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    VerifyEmail,
    ResetPassword,
}

impl TokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::VerifyEmail => "verify_email",
            TokenPurpose::ResetPassword => "reset_password",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneTimeToken {
    #[serde(rename = "_id")]
    pub token_hash: String,
    pub purpose: TokenPurpose,
    pub user_id: String,
    #[serde(with = "bson_datetime")]
    pub expires_at: DateTime<Utc>,
    #[serde(default, with = "bson_datetime_opt")]
    pub consumed_at: Option<DateTime<Utc>>,
    #[serde(with = "bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl OneTimeToken {
    /// 사용 가능 여부: 미사용이며 만료 전
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        self.consumed_at.is_none() && self.expires_at > now
    }
}
