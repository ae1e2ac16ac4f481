//! 프로세스 내 토큰 저장소들
//!
//! 폐기 목록과 발송 제한 카운터는 단조 시계(`Instant`)로 TTL을 관리하고,
//! 일회용 토큰 원장은 호출자가 넘긴 `now`로 만료를 판단합니다.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::errors::AppError;
use crate::domain::entities::tokens::{OneTimeToken, TokenPurpose};
use crate::repositories::lock_poisoned;
use crate::repositories::tokens::{OneTimeTokenStore, RevocationReason, RevocationStore, ThrottleStore};

#[derive(Default)]
pub struct InMemoryRevocationStore {
    entries: Mutex<HashMap<String, Instant>>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn revoke(&self, jti: &str, ttl_seconds: u64, _reason: RevocationReason) -> Result<bool, AppError> {
        let mut entries = self.entries.lock().map_err(lock_poisoned)?;
        let now = Instant::now();
        entries.retain(|_, expires_at| *expires_at > now);

        if entries.contains_key(jti) {
            return Ok(false);
        }
        entries.insert(jti.to_string(), now + Duration::from_secs(ttl_seconds.max(1)));
        Ok(true)
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, AppError> {
        let entries = self.entries.lock().map_err(lock_poisoned)?;
        Ok(entries.get(jti).is_some_and(|expires_at| *expires_at > Instant::now()))
    }
}

#[derive(Default)]
pub struct InMemoryThrottleStore {
    windows: Mutex<HashMap<String, (Instant, u64)>>,
}

impl InMemoryThrottleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ThrottleStore for InMemoryThrottleStore {
    async fn hit(&self, key: &str, window_seconds: u64) -> Result<u64, AppError> {
        let mut windows = self.windows.lock().map_err(lock_poisoned)?;
        let now = Instant::now();
        let window = windows.entry(key.to_string()).or_insert((now, 0));

        if now.duration_since(window.0) >= Duration::from_secs(window_seconds.max(1)) {
            *window = (now, 0);
        }
        window.1 += 1;
        Ok(window.1)
    }
}

#[derive(Default)]
pub struct InMemoryOneTimeTokenStore {
    tokens: Mutex<HashMap<String, OneTimeToken>>,
}

impl InMemoryOneTimeTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OneTimeTokenStore for InMemoryOneTimeTokenStore {
    async fn insert(&self, token: OneTimeToken) -> Result<(), AppError> {
        let mut tokens = self.tokens.lock().map_err(lock_poisoned)?;
        tokens.insert(token.token_hash.clone(), token);
        Ok(())
    }

    async fn consume(
        &self,
        token_hash: &str,
        purpose: TokenPurpose,
        now: DateTime<Utc>,
    ) -> Result<Option<String>, AppError> {
        let mut tokens = self.tokens.lock().map_err(lock_poisoned)?;
        match tokens.get_mut(token_hash) {
            Some(token) if token.purpose == purpose && token.is_redeemable(now) => {
                token.consumed_at = Some(now);
                Ok(Some(token.user_id.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn invalidate_for_user(
        &self,
        user_id: &str,
        purpose: TokenPurpose,
        now: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let mut tokens = self.tokens.lock().map_err(lock_poisoned)?;
        let mut count = 0;
        for token in tokens.values_mut() {
            if token.user_id == user_id && token.purpose == purpose && token.consumed_at.is_none() {
                token.consumed_at = Some(now);
                count += 1;
            }
        }
        Ok(count)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut tokens = self.tokens.lock().map_err(lock_poisoned)?;
        let before = tokens.len();
        tokens.retain(|_, token| token.expires_at > now);
        Ok((before - tokens.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn token(hash: &str, purpose: TokenPurpose, expires_at: DateTime<Utc>) -> OneTimeToken {
        OneTimeToken {
            token_hash: hash.to_string(),
            purpose,
            user_id: "u1".to_string(),
            expires_at,
            consumed_at: None,
            created_at: Utc::now(),
        }
    }

    #[actix_web::test]
    async fn test_revoke_reports_first_insert_only() {
        let store = InMemoryRevocationStore::new();
        assert!(store.revoke("jti-1", 60, RevocationReason::Rotated).await.unwrap());
        assert!(!store.revoke("jti-1", 60, RevocationReason::Rotated).await.unwrap());
        assert!(store.is_revoked("jti-1").await.unwrap());
        assert!(!store.is_revoked("jti-2").await.unwrap());
    }

    #[actix_web::test]
    async fn test_throttle_counts_within_window() {
        let store = InMemoryThrottleStore::new();
        assert_eq!(store.hit("a@x.io", 60).await.unwrap(), 1);
        assert_eq!(store.hit("a@x.io", 60).await.unwrap(), 2);
        assert_eq!(store.hit("b@x.io", 60).await.unwrap(), 1);
    }

    #[actix_web::test]
    async fn test_consume_at_most_once() {
        let store = InMemoryOneTimeTokenStore::new();
        let now = Utc::now();
        store
            .insert(token("h1", TokenPurpose::VerifyEmail, now + ChronoDuration::hours(1)))
            .await
            .unwrap();

        // 용도가 다르면 실패
        assert_eq!(store.consume("h1", TokenPurpose::ResetPassword, now).await.unwrap(), None);

        assert_eq!(
            store.consume("h1", TokenPurpose::VerifyEmail, now).await.unwrap(),
            Some("u1".to_string())
        );
        assert_eq!(store.consume("h1", TokenPurpose::VerifyEmail, now).await.unwrap(), None);
    }

    #[actix_web::test]
    async fn test_expired_token_cannot_be_consumed_and_is_purged() {
        let store = InMemoryOneTimeTokenStore::new();
        let now = Utc::now();
        store.insert(token("h1", TokenPurpose::ResetPassword, now)).await.unwrap();

        assert_eq!(store.consume("h1", TokenPurpose::ResetPassword, now).await.unwrap(), None);
        assert_eq!(store.purge_expired(now).await.unwrap(), 1);
    }

    #[actix_web::test]
    async fn test_invalidate_for_user_supersedes_open_tokens() {
        let store = InMemoryOneTimeTokenStore::new();
        let now = Utc::now();
        let later = now + ChronoDuration::hours(1);
        store.insert(token("h1", TokenPurpose::VerifyEmail, later)).await.unwrap();
        store.insert(token("h2", TokenPurpose::ResetPassword, later)).await.unwrap();

        assert_eq!(store.invalidate_for_user("u1", TokenPurpose::VerifyEmail, now).await.unwrap(), 1);
        assert_eq!(store.consume("h1", TokenPurpose::VerifyEmail, now).await.unwrap(), None);
        assert!(store.consume("h2", TokenPurpose::ResetPassword, now).await.unwrap().is_some());
    }
}
