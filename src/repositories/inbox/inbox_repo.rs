//! # Inbox 리포지토리 (MongoDB)
//!
//! `inbox` 컬렉션. `(message_id, consumer_id)` 유니크 인덱스가 중복 처리를 막습니다.
//!
//! 삽입은 두 단계입니다.
//! 1. 같은 키의 만료된 항목이 있으면 조건부 갱신으로 인수합니다
//! 2. 없으면 `insert_one`. 중복 키 에러는 "이미 처리됨"을 뜻합니다

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::IndexModel;
use singleton_macro::repository;

use crate::core::errors::AppError;
use crate::db::{is_duplicate_key, Database};
use crate::domain::entities::inbox::InboxEntry;
use crate::repositories::inbox::InboxStore;
use crate::utils::time_utils::to_bson;

#[repository(name = "inbox", collection = "inbox")]
pub struct InboxRepository {
    db: Arc<Database>,
}

#[async_trait]
impl InboxStore for InboxRepository {
    async fn insert_if_absent(&self, entry: InboxEntry, now: DateTime<Utc>) -> Result<bool, AppError> {
        let collection = self.collection::<InboxEntry>();

        let takeover = collection
            .update_one(
                doc! {
                    "message_id": &entry.message_id,
                    "consumer_id": &entry.consumer_id,
                    "expires_at": { "$lte": to_bson(now) },
                },
                doc! { "$set": {
                    "event_type": &entry.event_type,
                    "processed_at": to_bson(entry.processed_at),
                    "expires_at": to_bson(entry.expires_at),
                } },
            )
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        if takeover.modified_count > 0 {
            return Ok(true);
        }

        match collection.insert_one(&entry).await {
            Ok(_) => Ok(true),
            Err(error) if is_duplicate_key(&error) => Ok(false),
            Err(error) => Err(AppError::DatabaseError(error.to_string())),
        }
    }

    async fn remove(&self, message_id: &str, consumer_id: &str) -> Result<bool, AppError> {
        let result = self
            .collection::<InboxEntry>()
            .delete_one(doc! { "message_id": message_id, "consumer_id": consumer_id })
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(result.deleted_count > 0)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = self
            .collection::<InboxEntry>()
            .delete_many(doc! { "expires_at": { "$lte": to_bson(now) } })
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(result.deleted_count)
    }

    async fn create_indexes(&self) -> Result<(), AppError> {
        let unique_index = IndexModel::builder()
            .keys(doc! { "message_id": 1, "consumer_id": 1 })
            .options(IndexOptions::builder()
                .unique(true)
                .name("message_consumer_unique".to_string())
                .build())
            .build();

        let ttl_index = IndexModel::builder()
            .keys(doc! { "expires_at": 1 })
            .options(IndexOptions::builder()
                .name("expires_at_ttl".to_string())
                .expire_after(std::time::Duration::from_secs(0))
                .build())
            .build();

        self.collection::<InboxEntry>()
            .create_indexes([unique_index, ttl_index])
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}
