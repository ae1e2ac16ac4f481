//! User Entity Implementation
//!
//! 자격 증명을 가진 사용자 엔티티입니다.
//! 비밀번호는 해시로만 저장되며, `version`은 모든 변경마다 1씩 증가합니다.
//! `token_epoch`는 사용자 단위 토큰 폐기 카운터로, 증가하면 이전 epoch로 발급된
//! 모든 토큰이 다음 검증에서 거부됩니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::string_utils::normalize_email;
use crate::utils::time_utils::bson_datetime;

/// 프로필 이미지 참조 (저장소 키와 공개 URL)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Avatar {
    pub key: String,
    pub url: String,
}

/// 사용자 엔티티
///
/// MongoDB `users` 컬렉션의 문서와 1:1로 대응합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// UUID v4 문자열
    #[serde(rename = "_id")]
    pub id: String,

    /// 정규화된(소문자, 공백 제거) 이메일. 전역 유니크
    pub email: String,

    pub name: String,

    #[serde(default)]
    pub phone: Option<String>,

    /// bcrypt 해시
    pub password_hash: String,

    #[serde(default)]
    pub avatar: Option<Avatar>,

    pub is_active: bool,

    pub is_verified: bool,

    /// 토큰 폐기 epoch
    #[serde(default)]
    pub token_epoch: i64,

    /// 낙관적 잠금 버전
    pub version: i64,

    #[serde(with = "bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// 새 로컬 계정 생성 (미인증, 활성 상태)
    pub fn new_local(
        email: &str,
        name: String,
        phone: Option<String>,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: normalize_email(email),
            name,
            phone,
            password_hash,
            avatar: None,
            is_active: true,
            is_verified: false,
            token_epoch: 0,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_local_normalizes_email_and_starts_unverified() {
        let user = User::new_local("  Alice@X.COM ", "Alice".into(), None, "hash".into(), Utc::now());

        assert_eq!(user.email, "alice@x.com");
        assert!(user.is_active);
        assert!(!user.is_verified);
        assert_eq!(user.version, 1);
        assert_eq!(user.token_epoch, 0);
        assert!(Uuid::parse_str(&user.id).is_ok());
    }
}
