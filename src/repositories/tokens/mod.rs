//! 토큰 관련 저장소 모듈
//!
//! # Features
//!
//! - **Revocation Set**: 폐기된 jti 목록. Redis `SET NX EX`로 원자적으로 추가되고 토큰 만료 시 자동 소멸
//! - **Throttle Counter**: 이메일 발송 제한용 고정 윈도우 카운터 (`INCR` + `EXPIRE`)
//! - **One-Time Token Ledger**: 이메일 인증/비밀번호 재설정 토큰의 해시 원장 (MongoDB)
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::repositories::tokens::{RevocationStore, RevocationReason, TokenRepository};
//!
//! let token_repo = TokenRepository::instance();
//!
//! // 처음 폐기한 호출만 true
//! let first = token_repo.revoke("jti", 3600, RevocationReason::Logout).await?;
//! assert!(token_repo.is_revoked("jti").await?);
//! ```

pub mod memory;
pub mod one_time_token_repo;
pub mod token_repository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::errors::AppError;
use crate::domain::entities::tokens::{OneTimeToken, TokenPurpose};

pub use memory::{InMemoryOneTimeTokenStore, InMemoryRevocationStore, InMemoryThrottleStore};
pub use one_time_token_repo::OneTimeTokenRepository;
pub use token_repository::TokenRepository;

/// 블랙리스트 추가 이유
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationReason {
    Logout,
    Rotated,
}

impl RevocationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RevocationReason::Logout => "logout",
            RevocationReason::Rotated => "rotated",
        }
    }
}

/// 폐기된 jti 집합
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// jti를 `ttl_seconds` 동안 폐기 목록에 추가합니다.
    ///
    /// 이 호출이 추가했으면 `true`, 이미 있었으면 `false`. 동시 호출 중 정확히 하나만 `true`를 받습니다.
    async fn revoke(&self, jti: &str, ttl_seconds: u64, reason: RevocationReason) -> Result<bool, AppError>;

    async fn is_revoked(&self, jti: &str) -> Result<bool, AppError>;
}

/// 고정 윈도우 발송 제한 카운터
#[async_trait]
pub trait ThrottleStore: Send + Sync {
    /// 키의 현재 윈도우 카운트를 1 증가시키고 증가된 값을 반환합니다.
    async fn hit(&self, key: &str, window_seconds: u64) -> Result<u64, AppError>;
}

/// 일회용 토큰 원장
#[async_trait]
pub trait OneTimeTokenStore: Send + Sync {
    async fn insert(&self, token: OneTimeToken) -> Result<(), AppError>;

    /// (해시, 용도, 미사용, 미만료) 조건에서 `consumed_at`을 원자적으로 설정합니다.
    ///
    /// 성공하면 토큰의 사용자 ID, 조건이 맞지 않으면 `None`.
    async fn consume(
        &self,
        token_hash: &str,
        purpose: TokenPurpose,
        now: DateTime<Utc>,
    ) -> Result<Option<String>, AppError>;

    /// 사용자의 해당 용도 미사용 토큰을 모두 사용 처리합니다 (새 토큰 발급 시).
    async fn invalidate_for_user(
        &self,
        user_id: &str,
        purpose: TokenPurpose,
        now: DateTime<Utc>,
    ) -> Result<u64, AppError>;

    /// 만료된 토큰 삭제
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;

    async fn create_indexes(&self) -> Result<(), AppError> {
        Ok(())
    }
}
