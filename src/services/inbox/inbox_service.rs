//! # Inbox Deduplicator
//!
//! 메시지를 소비자별로 최대 한 번만 처리하도록 보장합니다.
//!
//! ```rust,ignore
//! if inbox.process_if_new(&message_id, "audit-log", "user.registered", ttl).await? {
//!     // 처음 보는 메시지: 처리
//! } else {
//!     // 이미 처리됨: 건너뜀
//! }
//! ```
//!
//! HTTP 멱등성 키도 같은 저장소를 사용합니다. 키, 메서드, 경로, 쿼리 문자열의 SHA-256에서
//! 안정적인 UUID를 유도해 메시지 ID로 씁니다([`InboxService::http_message_id`]).

use std::sync::Arc;

use chrono::Duration;
use uuid::Uuid;

use crate::core::errors::AppError;
use crate::domain::entities::inbox::InboxEntry;
use crate::repositories::inbox::InboxStore;
use crate::utils::clock::Clock;
use crate::utils::crypto::sha256_parts;

/// HTTP 쓰기 요청의 소비자 ID
pub const HTTP_CONSUMER_ID: &str = "http-api";

pub struct InboxService {
    store: Arc<dyn InboxStore>,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
}

impl InboxService {
    pub fn new(store: Arc<dyn InboxStore>, clock: Arc<dyn Clock>, default_ttl: Duration) -> Self {
        Self {
            store,
            clock,
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// `(message_id, consumer_id)`를 원자적으로 기록합니다.
    ///
    /// 이 호출이 기록했으면 `true`(처리 진행), 유효한 기록이 이미 있으면 `false`.
    pub async fn process_if_new(
        &self,
        message_id: &str,
        consumer_id: &str,
        event_type: &str,
        ttl: Duration,
    ) -> Result<bool, AppError> {
        let now = self.clock.now();
        let entry = InboxEntry {
            message_id: message_id.to_string(),
            consumer_id: consumer_id.to_string(),
            event_type: event_type.to_string(),
            processed_at: now,
            expires_at: now + ttl,
        };

        let inserted = self.store.insert_if_absent(entry, now).await?;
        if !inserted {
            log::debug!("중복 메시지 무시: message_id={}, consumer={}", message_id, consumer_id);
        }
        Ok(inserted)
    }

    /// 처리에 실패한 메시지의 기록을 지워 재전달 시 다시 처리되게 합니다.
    pub async fn release(&self, message_id: &str, consumer_id: &str) -> Result<(), AppError> {
        if self.store.remove(message_id, consumer_id).await? {
            log::debug!("인박스 기록 해제: message_id={}, consumer={}", message_id, consumer_id);
        }
        Ok(())
    }

    /// 멱등성 키에서 메시지 ID를 유도합니다.
    ///
    /// 같은 `(key, method, path, query)`는 항상 같은 UUID가 됩니다.
    pub fn http_message_id(key: &str, method: &str, path: &str, query: &str) -> String {
        let digest = sha256_parts(&[key, method, path, query]);
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        Uuid::from_bytes(bytes).to_string()
    }

    /// `http.<method>.<route>` 형식의 이벤트 타입
    pub fn http_event_type(method: &str, path: &str) -> String {
        format!("http.{}.{}", method.to_lowercase(), path)
    }

    /// 만료된 항목 삭제
    pub async fn purge_expired(&self) -> Result<u64, AppError> {
        self.store.purge_expired(self.clock.now()).await
    }
}
