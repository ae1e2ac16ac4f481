//! JWT 인증 토큰 구조체 및 페어링 된 세트
//!
//! RFC 7519 표준 클레임에 토큰 종류(`kind`)와 사용자 폐기 epoch(`epoch`)를 더한 형태입니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 토큰의 용도
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// JWT 토큰의 클레임(Payload) 구조체
///
/// 개인정보 보호를 위해 이메일이나 역할은 담지 않습니다.
/// 역할과 권한은 요청마다 저장소에서 조회되므로 회수가 즉시 반영됩니다.
///
/// ## 클레임 구성
///
/// - `iss`: 발급자
/// - `sub`: 사용자 ID
/// - `kind`: `access` | `refresh`
/// - `iat`, `exp`: Unix timestamp (초)
/// - `jti`: 발급마다 새로 생성되는 UUID
/// - `epoch`: 발급 시점의 사용자 토큰 epoch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    pub iss: String,
    pub sub: String,
    pub kind: TokenKind,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub epoch: i64,
}

impl TokenClaims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// 만료까지 남은 초 (이미 만료되었으면 0)
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> u64 {
        (self.exp - now.timestamp()).max(0) as u64
    }
}

/// 발급된 access/refresh 토큰 쌍
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_jti: String,
    pub refresh_jti: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
    /// access 토큰 만료까지 남은 초
    pub access_expires_in: i64,
    pub refresh_expires_in: i64,
}
