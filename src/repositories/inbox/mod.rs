//! # Inbox 저장소
//!
//! `(message_id, consumer_id)` 유니크 키 위의 원자적 "없으면 삽입" 연산을 제공합니다.
//! 만료 시각이 지난 항목은 스위퍼가 지우기 전에도 없는 것으로 취급됩니다.

pub mod inbox_repo;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::errors::AppError;
use crate::domain::entities::inbox::InboxEntry;

pub use inbox_repo::InboxRepository;
pub use memory::InMemoryInboxStore;

#[async_trait]
pub trait InboxStore: Send + Sync {
    /// 항목이 없거나 만료되었으면 기록하고 `true`, 유효한 항목이 이미 있으면 `false`
    ///
    /// 같은 키에 대한 동시 호출 중 정확히 하나만 `true`를 받습니다.
    async fn insert_if_absent(&self, entry: InboxEntry, now: DateTime<Utc>) -> Result<bool, AppError>;

    /// 항목 삭제. 처리에 실패한 메시지를 다시 받을 수 있게 합니다.
    async fn remove(&self, message_id: &str, consumer_id: &str) -> Result<bool, AppError>;

    /// 만료된 항목 삭제
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;

    async fn create_indexes(&self) -> Result<(), AppError> {
        Ok(())
    }
}
