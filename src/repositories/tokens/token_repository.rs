//! # 토큰 상태 리포지토리 (Redis)
//!
//! 폐기 목록과 발송 제한 카운터는 TTL로 자연 소멸하는 키-값 데이터이므로 Redis에 둡니다.
//!
//! | 키 | 값 | TTL |
//! |----|----|-----|
//! | `blacklist:{jti}` | 폐기 사유 | 토큰의 남은 수명 |
//! | `throttle:{key}` | 카운트 | 윈도우 길이 |

use std::sync::Arc;

use async_trait::async_trait;
use singleton_macro::repository;

use crate::caching::redis::RedisClient;
use crate::core::errors::AppError;
// 매크로가 생성한 캐시 헬퍼가 `self.name()`을 사용합니다
#[allow(unused_imports)]
use crate::core::registry::Repository;
use crate::repositories::tokens::{RevocationReason, RevocationStore, ThrottleStore};

/// JWT 토큰 관리를 위한 Repository
///
/// Redis를 사용하여 다음 기능을 제공합니다:
/// - Access/Refresh Token Blacklist 관리 (jti 기준, O(1) 조회)
/// - 이메일 발송 제한 카운터
#[repository(name = "token", collection = "tokens")]
pub struct TokenRepository {
    redis: Arc<RedisClient>,
}

impl TokenRepository {
    fn blacklist_key(jti: &str) -> String {
        format!("blacklist:{}", jti)
    }

    fn throttle_key(key: &str) -> String {
        format!("throttle:{}", key)
    }
}

#[async_trait]
impl RevocationStore for TokenRepository {
    async fn revoke(&self, jti: &str, ttl_seconds: u64, reason: RevocationReason) -> Result<bool, AppError> {
        let inserted = self
            .redis
            .set_nx_with_expiry(&Self::blacklist_key(jti), reason.as_str(), ttl_seconds)
            .await
            .map_err(|e| AppError::RedisError(e.to_string()))?;

        if inserted {
            log::debug!("토큰 폐기 - jti: {}, 사유: {}, TTL: {}초", jti, reason.as_str(), ttl_seconds);
        }
        Ok(inserted)
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, AppError> {
        self.redis
            .exists(&Self::blacklist_key(jti))
            .await
            .map_err(|e| AppError::RedisError(e.to_string()))
    }
}

#[async_trait]
impl ThrottleStore for TokenRepository {
    async fn hit(&self, key: &str, window_seconds: u64) -> Result<u64, AppError> {
        self.redis
            .incr_with_window(&Self::throttle_key(key), window_seconds)
            .await
            .map_err(|e| AppError::RedisError(e.to_string()))
    }
}
