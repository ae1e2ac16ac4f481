//! # 사용자 리포지토리 구현
//!
//! `users` 컬렉션에 대한 [`CredentialStore`] MongoDB 구현입니다.
//!
//! ## 특징
//!
//! - **자동 의존성 주입**: 싱글톤 매크로를 통한 DI
//! - **원자적 변경**: 모든 쓰기는 `find_one_and_update` 한 번으로 수행되고 `$inc`로 버전을 올립니다
//! - **캐시 없음**: epoch는 요청마다 primary에서 읽어 logout-all이 즉시 반영됩니다
//! - **데이터 무결성**: 이메일 유니크 인덱스

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::{doc, Document};
use mongodb::options::{FindOneAndUpdateOptions, IndexOptions, ReturnDocument};
use mongodb::IndexModel;
use singleton_macro::repository;

use crate::core::errors::AppError;
use crate::db::{map_mongo_error, Database};
use crate::domain::entities::users::user::User;
use crate::repositories::users::{CredentialStore, EMAIL_CONFLICT, VERSION_CONFLICT};
use crate::utils::retry::with_read_retry;
use crate::utils::string_utils::normalize_email;
use crate::utils::time_utils::to_bson;

/// 사용자 데이터 액세스 리포지토리
///
/// ## 인덱스
/// - `email_unique`: email (unique)
/// - `created_at_desc`: created_at
///
/// ## 사용 예제
///
/// ```rust,ignore
/// let repo = UserRepository::instance();
/// let user = repo.get_by_email("alice@example.com").await?;
/// let epoch = repo.increment_epoch(&user.id, Utc::now()).await?;
/// ```
#[repository(name = "user", collection = "users")]
pub struct UserRepository {
    /// MongoDB 데이터베이스 연결
    db: Arc<Database>,
}

impl UserRepository {
    /// `_id` 기준 원자적 갱신 후 갱신된 문서를 반환합니다.
    async fn modify(&self, id: &str, update: Document) -> Result<User, AppError> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        self.collection::<User>()
            .find_one_and_update(doc! { "_id": id }, update)
            .with_options(options)
            .await
            .map_err(|e| map_mongo_error(e, EMAIL_CONFLICT))?
            .ok_or_else(|| AppError::NotFound("사용자를 찾을 수 없습니다".to_string()))
    }
}

#[async_trait]
impl CredentialStore for UserRepository {
    async fn create(&self, mut user: User) -> Result<User, AppError> {
        user.email = normalize_email(&user.email);
        self.collection::<User>()
            .insert_one(&user)
            .await
            .map_err(|e| map_mongo_error(e, EMAIL_CONFLICT))?;

        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        let collection = &self.collection::<User>();
        with_read_retry(|| async move { collection.find_one(doc! { "_id": id }).await })
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = &normalize_email(email);
        let collection = &self.collection::<User>();
        with_read_retry(|| async move { collection.find_one(doc! { "email": email }).await })
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))
    }

    async fn update(&self, user: User, now: DateTime<Utc>) -> Result<User, AppError> {
        let avatar = match &user.avatar {
            Some(avatar) => mongodb::bson::to_bson(avatar)
                .map_err(|e| AppError::InternalError(format!("아바타 직렬화 실패: {}", e)))?,
            None => mongodb::bson::Bson::Null,
        };

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        let updated = self
            .collection::<User>()
            .find_one_and_update(
                doc! { "_id": &user.id, "version": user.version },
                doc! {
                    "$set": {
                        "name": &user.name,
                        "phone": user.phone.as_deref(),
                        "avatar": avatar,
                        "updated_at": to_bson(now),
                    },
                    "$inc": { "version": 1 },
                },
            )
            .with_options(options)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        match updated {
            Some(updated) => Ok(updated),
            None => match self.find_by_id(&user.id).await? {
                Some(_) => Err(AppError::ConflictError(VERSION_CONFLICT.to_string())),
                None => Err(AppError::NotFound("사용자를 찾을 수 없습니다".to_string())),
            },
        }
    }

    async fn set_active(&self, id: &str, active: bool, now: DateTime<Utc>) -> Result<User, AppError> {
        let epoch_step = if active { 0 } else { 1 };
        self.modify(
            id,
            doc! {
                "$set": { "is_active": active, "updated_at": to_bson(now) },
                "$inc": { "version": 1, "token_epoch": epoch_step },
            },
        )
        .await
    }

    async fn mark_verified(&self, id: &str, now: DateTime<Utc>) -> Result<User, AppError> {
        self.modify(
            id,
            doc! {
                "$set": { "is_verified": true, "updated_at": to_bson(now) },
                "$inc": { "version": 1 },
            },
        )
        .await
    }

    async fn update_password(&self, id: &str, password_hash: &str, now: DateTime<Utc>) -> Result<User, AppError> {
        self.modify(
            id,
            doc! {
                "$set": { "password_hash": password_hash, "updated_at": to_bson(now) },
                "$inc": { "version": 1, "token_epoch": 1 },
            },
        )
        .await
    }

    async fn increment_epoch(&self, id: &str, now: DateTime<Utc>) -> Result<i64, AppError> {
        let user = self
            .modify(
                id,
                doc! {
                    "$set": { "updated_at": to_bson(now) },
                    "$inc": { "version": 1, "token_epoch": 1 },
                },
            )
            .await?;
        Ok(user.token_epoch)
    }

    async fn create_indexes(&self) -> Result<(), AppError> {
        let collection = self.collection::<User>();

        // 이메일 유니크 인덱스
        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder()
                .unique(true)
                .name("email_unique".to_string())
                .build())
            .build();

        // 생성일 인덱스
        let created_at_index = IndexModel::builder()
            .keys(doc! { "created_at": -1 })
            .options(IndexOptions::builder()
                .name("created_at_desc".to_string())
                .build())
            .build();

        collection
            .create_indexes([email_index, created_at_index])
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}
