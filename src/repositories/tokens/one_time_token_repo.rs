//! # 일회용 토큰 리포지토리 (MongoDB)
//!
//! `one_time_tokens` 컬렉션. `_id`는 토큰 원문의 SHA-256 해시입니다.
//! 사용 처리는 `find_one_and_update` 한 번으로 수행되어 동시 시도 중 하나만 성공합니다.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::{doc, Bson};
use mongodb::options::IndexOptions;
use mongodb::IndexModel;
use singleton_macro::repository;

use crate::core::errors::AppError;
use crate::db::Database;
use crate::domain::entities::tokens::{OneTimeToken, TokenPurpose};
use crate::repositories::tokens::OneTimeTokenStore;
use crate::utils::time_utils::to_bson;

#[repository(name = "one_time_token", collection = "one_time_tokens")]
pub struct OneTimeTokenRepository {
    db: Arc<Database>,
}

fn db_error(error: mongodb::error::Error) -> AppError {
    AppError::DatabaseError(error.to_string())
}

#[async_trait]
impl OneTimeTokenStore for OneTimeTokenRepository {
    async fn insert(&self, token: OneTimeToken) -> Result<(), AppError> {
        self.collection::<OneTimeToken>()
            .insert_one(&token)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn consume(
        &self,
        token_hash: &str,
        purpose: TokenPurpose,
        now: DateTime<Utc>,
    ) -> Result<Option<String>, AppError> {
        let consumed = self
            .collection::<OneTimeToken>()
            .find_one_and_update(
                doc! {
                    "_id": token_hash,
                    "purpose": purpose.as_str(),
                    "consumed_at": Bson::Null,
                    "expires_at": { "$gt": to_bson(now) },
                },
                doc! { "$set": { "consumed_at": to_bson(now) } },
            )
            .await
            .map_err(db_error)?;

        Ok(consumed.map(|token| token.user_id))
    }

    async fn invalidate_for_user(
        &self,
        user_id: &str,
        purpose: TokenPurpose,
        now: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let result = self
            .collection::<OneTimeToken>()
            .update_many(
                doc! { "user_id": user_id, "purpose": purpose.as_str(), "consumed_at": Bson::Null },
                doc! { "$set": { "consumed_at": to_bson(now) } },
            )
            .await
            .map_err(db_error)?;
        Ok(result.modified_count)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = self
            .collection::<OneTimeToken>()
            .delete_many(doc! { "expires_at": { "$lte": to_bson(now) } })
            .await
            .map_err(db_error)?;
        Ok(result.deleted_count)
    }

    async fn create_indexes(&self) -> Result<(), AppError> {
        let user_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "purpose": 1 })
            .options(IndexOptions::builder().name("user_purpose".to_string()).build())
            .build();

        // 만료 즉시 MongoDB가 자동 삭제
        let ttl_index = IndexModel::builder()
            .keys(doc! { "expires_at": 1 })
            .options(IndexOptions::builder()
                .name("expires_at_ttl".to_string())
                .expire_after(std::time::Duration::from_secs(0))
                .build())
            .build();

        self.collection::<OneTimeToken>()
            .create_indexes([user_index, ttl_index])
            .await
            .map_err(db_error)?;
        Ok(())
    }
}
