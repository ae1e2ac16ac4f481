//! # 역할/권한 리포지토리 구현
//!
//! 네 개의 컬렉션(`roles`, `permissions`, `role_permissions`, `user_roles`)에 대한
//! [`RbacStore`] MongoDB 구현입니다.
//!
//! - 권한 동기화는 다중 문서 트랜잭션으로 수행됩니다 (replica set 필요)
//! - 유효 권한/역할 조회는 `user_roles`에서 시작하는 단일 aggregation 파이프라인이며,
//!   읽기 전용 복제본이 구성되어 있으면 복제본에서 실행됩니다

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::bson::{doc, from_document, Bson, Document};
use mongodb::options::{FindOneAndUpdateOptions, IndexOptions, ReturnDocument};
use mongodb::{ClientSession, Collection, IndexModel};
use serde::de::DeserializeOwned;
use singleton_macro::repository;
use uuid::Uuid;

use crate::core::errors::AppError;
use crate::db::{is_duplicate_key, map_mongo_error, Database};
use crate::domain::entities::rbac::{Permission, Role, RolePermission, UserRole};
use crate::repositories::rbac::{RbacStore, PERMISSION_CONFLICT, ROLE_CONFLICT, ROLE_VERSION_CONFLICT};
use crate::utils::retry::with_read_retry;
use crate::utils::time_utils::to_bson;

const PERMISSIONS: &str = "permissions";
const ROLE_PERMISSIONS: &str = "role_permissions";
const USER_ROLES: &str = "user_roles";

fn db_error(error: mongodb::error::Error) -> AppError {
    AppError::DatabaseError(error.to_string())
}

fn optional_string(value: Option<&str>) -> Bson {
    value.map(|v| Bson::String(v.to_string())).unwrap_or(Bson::Null)
}

/// 역할/권한 데이터 액세스 리포지토리
///
/// ## 인덱스
/// - `roles.name` (unique)
/// - `permissions.name` (unique), `permissions.resource`
/// - `role_permissions.(role_id, permission_id)` (unique), `role_permissions.permission_id`
/// - `user_roles.(user_id, role_id)` (unique), `user_roles.role_id`, `user_roles.expires_at`
#[repository(name = "rbac", collection = "roles")]
pub struct RbacRepository {
    db: Arc<Database>,
}

impl RbacRepository {
    fn roles(&self) -> Collection<Role> {
        self.collection::<Role>()
    }

    fn permissions(&self) -> Collection<Permission> {
        self.db.get_database().collection::<Permission>(PERMISSIONS)
    }

    fn grants(&self) -> Collection<RolePermission> {
        self.db.get_database().collection::<RolePermission>(ROLE_PERMISSIONS)
    }

    fn assignments(&self) -> Collection<UserRole> {
        self.db.get_database().collection::<UserRole>(USER_ROLES)
    }

    async fn find_all<T>(collection: &Collection<T>, filter: Document, sort: Document) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Unpin + Send + Sync,
    {
        with_read_retry(|| {
            let filter = filter.clone();
            let sort = sort.clone();
            async move { collection.find(filter).sort(sort).await?.try_collect::<Vec<T>>().await }
        })
        .await
        .map_err(db_error)
    }

    /// 유효 할당 → 활성 역할까지의 파이프라인 단계
    fn effective_role_stages(user_id: &str, now: DateTime<Utc>) -> Vec<Document> {
        vec![
            doc! { "$match": {
                "user_id": user_id,
                "is_active": true,
                "$or": [ { "expires_at": Bson::Null }, { "expires_at": { "$gt": to_bson(now) } } ],
            } },
            doc! { "$lookup": { "from": "roles", "localField": "role_id", "foreignField": "_id", "as": "role" } },
            doc! { "$unwind": "$role" },
            doc! { "$match": { "role.is_active": true } },
        ]
    }

    async fn aggregate<T: DeserializeOwned>(&self, pipeline: Vec<Document>) -> Result<Vec<T>, AppError> {
        let collection = &self.db.read_database().collection::<Document>(USER_ROLES);
        let documents = with_read_retry(|| {
            let pipeline = pipeline.clone();
            async move { collection.aggregate(pipeline).await?.try_collect::<Vec<Document>>().await }
        })
        .await
        .map_err(db_error)?;

        documents
            .into_iter()
            .map(|document| {
                from_document::<T>(document).map_err(|e| AppError::DatabaseError(format!("문서 변환 실패: {}", e)))
            })
            .collect()
    }

    async fn sync_in_session(
        &self,
        session: &mut ClientSession,
        role_id: &str,
        permission_ids: &[String],
        granted_by: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), mongodb::error::Error> {
        let grants = self.grants();

        // 목록에 없는 활성 부여 회수
        grants
            .update_many(
                doc! { "role_id": role_id, "is_active": true, "permission_id": { "$nin": permission_ids } },
                doc! { "$set": { "is_active": false } },
            )
            .session(&mut *session)
            .await?;

        // 목록에 있는 비활성 부여 재활성화
        grants
            .update_many(
                doc! { "role_id": role_id, "is_active": false, "permission_id": { "$in": permission_ids } },
                doc! { "$set": { "is_active": true, "granted_by": optional_string(granted_by), "granted_at": to_bson(now) } },
            )
            .session(&mut *session)
            .await?;

        // 없는 부여 생성
        for permission_id in permission_ids {
            grants
                .update_one(
                    doc! { "role_id": role_id, "permission_id": permission_id },
                    doc! { "$setOnInsert": {
                        "_id": Uuid::new_v4().to_string(),
                        "granted_by": optional_string(granted_by),
                        "granted_at": to_bson(now),
                        "is_active": true,
                    } },
                )
                .upsert(true)
                .session(&mut *session)
                .await?;
        }

        Ok(())
    }
}

#[async_trait]
impl RbacStore for RbacRepository {
    async fn create_role(&self, role: Role) -> Result<Role, AppError> {
        self.roles()
            .insert_one(&role)
            .await
            .map_err(|e| map_mongo_error(e, ROLE_CONFLICT))?;
        Ok(role)
    }

    async fn find_role_by_id(&self, id: &str) -> Result<Option<Role>, AppError> {
        let roles = &self.roles();
        with_read_retry(|| async move { roles.find_one(doc! { "_id": id }).await })
            .await
            .map_err(db_error)
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, AppError> {
        let roles = &self.roles();
        with_read_retry(|| async move { roles.find_one(doc! { "name": name }).await })
            .await
            .map_err(db_error)
    }

    async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        Self::find_all(&self.roles(), doc! {}, doc! { "name": 1 }).await
    }

    async fn update_role(&self, role: Role, now: DateTime<Utc>) -> Result<Role, AppError> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        let updated = self
            .roles()
            .find_one_and_update(
                doc! { "_id": &role.id, "version": role.version },
                doc! {
                    "$set": {
                        "name": &role.name,
                        "description": role.description.as_deref(),
                        "is_active": role.is_active,
                        "updated_at": to_bson(now),
                    },
                    "$inc": { "version": 1 },
                },
            )
            .with_options(options)
            .await
            .map_err(|e| map_mongo_error(e, ROLE_CONFLICT))?;

        match updated {
            Some(updated) => Ok(updated),
            None => match self.find_role_by_id(&role.id).await? {
                Some(_) => Err(AppError::ConflictError(ROLE_VERSION_CONFLICT.to_string())),
                None => Err(AppError::NotFound("역할을 찾을 수 없습니다".to_string())),
            },
        }
    }

    async fn delete_role(&self, id: &str) -> Result<bool, AppError> {
        let deleted = self.roles().delete_one(doc! { "_id": id }).await.map_err(db_error)?;
        if deleted.deleted_count == 0 {
            return Ok(false);
        }

        self.grants()
            .update_many(doc! { "role_id": id }, doc! { "$set": { "is_active": false } })
            .await
            .map_err(db_error)?;
        self.assignments()
            .update_many(doc! { "role_id": id }, doc! { "$set": { "is_active": false } })
            .await
            .map_err(db_error)?;
        Ok(true)
    }

    async fn create_permission(&self, permission: Permission) -> Result<Permission, AppError> {
        self.permissions()
            .insert_one(&permission)
            .await
            .map_err(|e| map_mongo_error(e, PERMISSION_CONFLICT))?;
        Ok(permission)
    }

    async fn find_permission_by_id(&self, id: &str) -> Result<Option<Permission>, AppError> {
        let permissions = &self.permissions();
        with_read_retry(|| async move { permissions.find_one(doc! { "_id": id }).await })
            .await
            .map_err(db_error)
    }

    async fn find_permission_by_name(&self, name: &str) -> Result<Option<Permission>, AppError> {
        let permissions = &self.permissions();
        with_read_retry(|| async move { permissions.find_one(doc! { "name": name }).await })
            .await
            .map_err(db_error)
    }

    async fn find_permissions_by_ids(&self, ids: &[String]) -> Result<Vec<Permission>, AppError> {
        Self::find_all(&self.permissions(), doc! { "_id": { "$in": ids } }, doc! { "name": 1 }).await
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>, AppError> {
        Self::find_all(&self.permissions(), doc! {}, doc! { "name": 1 }).await
    }

    async fn update_permission(&self, permission: Permission, now: DateTime<Utc>) -> Result<Permission, AppError> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        self.permissions()
            .find_one_and_update(
                doc! { "_id": &permission.id },
                doc! { "$set": {
                    "description": permission.description.as_deref(),
                    "is_active": permission.is_active,
                    "updated_at": to_bson(now),
                } },
            )
            .with_options(options)
            .await
            .map_err(db_error)?
            .ok_or_else(|| AppError::NotFound("권한을 찾을 수 없습니다".to_string()))
    }

    async fn delete_permission(&self, id: &str) -> Result<bool, AppError> {
        let deleted = self.permissions().delete_one(doc! { "_id": id }).await.map_err(db_error)?;
        if deleted.deleted_count == 0 {
            return Ok(false);
        }

        self.grants()
            .update_many(doc! { "permission_id": id }, doc! { "$set": { "is_active": false } })
            .await
            .map_err(db_error)?;
        Ok(true)
    }

    async fn grant_permission(
        &self,
        role_id: &str,
        permission_id: &str,
        granted_by: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<RolePermission, AppError> {
        let grants = self.grants();

        // 비활성 부여 재활성화
        grants
            .update_one(
                doc! { "role_id": role_id, "permission_id": permission_id, "is_active": false },
                doc! { "$set": { "is_active": true, "granted_by": optional_string(granted_by), "granted_at": to_bson(now) } },
            )
            .await
            .map_err(db_error)?;

        // 없으면 생성. 동시 생성으로 인한 중복 키는 이미 부여된 것으로 봅니다
        let upsert = grants
            .update_one(
                doc! { "role_id": role_id, "permission_id": permission_id },
                doc! { "$setOnInsert": {
                    "_id": Uuid::new_v4().to_string(),
                    "granted_by": optional_string(granted_by),
                    "granted_at": to_bson(now),
                    "is_active": true,
                } },
            )
            .upsert(true)
            .await;
        if let Err(error) = upsert {
            if !is_duplicate_key(&error) {
                return Err(db_error(error));
            }
        }

        grants
            .find_one(doc! { "role_id": role_id, "permission_id": permission_id })
            .await
            .map_err(db_error)?
            .ok_or_else(|| AppError::InternalError("부여 레코드를 읽을 수 없습니다".to_string()))
    }

    async fn revoke_permission(&self, role_id: &str, permission_id: &str) -> Result<bool, AppError> {
        let result = self
            .grants()
            .update_one(
                doc! { "role_id": role_id, "permission_id": permission_id, "is_active": true },
                doc! { "$set": { "is_active": false } },
            )
            .await
            .map_err(db_error)?;
        Ok(result.modified_count > 0)
    }

    async fn sync_role_permissions(
        &self,
        role_id: &str,
        permission_ids: &[String],
        granted_by: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut session = self.db.client().start_session().await.map_err(db_error)?;
        session.start_transaction().await.map_err(db_error)?;

        match self.sync_in_session(&mut session, role_id, permission_ids, granted_by, now).await {
            Ok(()) => session.commit_transaction().await.map_err(db_error),
            Err(error) => {
                if let Err(abort_error) = session.abort_transaction().await {
                    log::warn!("권한 동기화 트랜잭션 중단 실패: {}", abort_error);
                }
                Err(map_mongo_error(error, "다른 요청이 같은 역할의 권한을 동시에 변경했습니다"))
            }
        }
    }

    async fn role_permissions(&self, role_id: &str) -> Result<Vec<Permission>, AppError> {
        let grants = Self::find_all(
            &self.grants(),
            doc! { "role_id": role_id, "is_active": true },
            doc! { "granted_at": 1 },
        )
        .await?;
        let ids: Vec<String> = grants.into_iter().map(|grant| grant.permission_id).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.find_permissions_by_ids(&ids).await
    }

    async fn assign_role(
        &self,
        user_id: &str,
        role_id: &str,
        assigned_by: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<UserRole, AppError> {
        let expires_at = expires_at.map(to_bson).map(Bson::DateTime).unwrap_or(Bson::Null);
        let filter = doc! { "user_id": user_id, "role_id": role_id };
        let update = doc! {
            "$set": { "is_active": true, "expires_at": expires_at },
            "$setOnInsert": {
                "_id": Uuid::new_v4().to_string(),
                "assigned_by": optional_string(assigned_by),
                "assigned_at": to_bson(now),
            },
        };
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        let assignments = self.assignments();
        let result = assignments
            .find_one_and_update(filter.clone(), update.clone())
            .with_options(options.clone())
            .await;

        let assignment = match result {
            Ok(assignment) => assignment,
            // 동시 upsert 경합: 이미 생긴 문서를 갱신합니다
            Err(error) if is_duplicate_key(&error) => assignments
                .find_one_and_update(filter, update)
                .with_options(options)
                .await
                .map_err(db_error)?,
            Err(error) => return Err(db_error(error)),
        };

        assignment.ok_or_else(|| AppError::InternalError("할당 레코드를 읽을 수 없습니다".to_string()))
    }

    async fn unassign_role(&self, user_id: &str, role_id: &str) -> Result<bool, AppError> {
        let result = self
            .assignments()
            .update_one(
                doc! { "user_id": user_id, "role_id": role_id, "is_active": true },
                doc! { "$set": { "is_active": false } },
            )
            .await
            .map_err(db_error)?;
        Ok(result.modified_count > 0)
    }

    async fn user_role_history(&self, user_id: &str) -> Result<Vec<UserRole>, AppError> {
        Self::find_all(&self.assignments(), doc! { "user_id": user_id }, doc! { "assigned_at": -1 }).await
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = self
            .assignments()
            .update_many(
                doc! { "is_active": true, "expires_at": { "$ne": Bson::Null, "$lte": to_bson(now) } },
                doc! { "$set": { "is_active": false } },
            )
            .await
            .map_err(db_error)?;
        Ok(result.modified_count)
    }

    async fn effective_roles(&self, user_id: &str, now: DateTime<Utc>) -> Result<Vec<Role>, AppError> {
        let mut pipeline = Self::effective_role_stages(user_id, now);
        pipeline.extend([
            doc! { "$replaceRoot": { "newRoot": "$role" } },
            doc! { "$group": { "_id": "$_id", "doc": { "$first": "$$ROOT" } } },
            doc! { "$replaceRoot": { "newRoot": "$doc" } },
            doc! { "$sort": { "name": 1 } },
        ]);
        self.aggregate(pipeline).await
    }

    async fn effective_permissions(&self, user_id: &str, now: DateTime<Utc>) -> Result<Vec<Permission>, AppError> {
        let mut pipeline = Self::effective_role_stages(user_id, now);
        pipeline.extend([
            doc! { "$lookup": { "from": ROLE_PERMISSIONS, "localField": "role_id", "foreignField": "role_id", "as": "grant" } },
            doc! { "$unwind": "$grant" },
            doc! { "$match": { "grant.is_active": true } },
            doc! { "$lookup": { "from": PERMISSIONS, "localField": "grant.permission_id", "foreignField": "_id", "as": "permission" } },
            doc! { "$unwind": "$permission" },
            doc! { "$match": { "permission.is_active": true } },
            doc! { "$replaceRoot": { "newRoot": "$permission" } },
            doc! { "$group": { "_id": "$_id", "doc": { "$first": "$$ROOT" } } },
            doc! { "$replaceRoot": { "newRoot": "$doc" } },
            doc! { "$sort": { "name": 1 } },
        ]);
        self.aggregate(pipeline).await
    }

    async fn create_indexes(&self) -> Result<(), AppError> {
        let unique = |name: &str| IndexOptions::builder().unique(true).name(name.to_string()).build();
        let named = |name: &str| IndexOptions::builder().name(name.to_string()).build();

        self.roles()
            .create_index(IndexModel::builder().keys(doc! { "name": 1 }).options(unique("name_unique")).build())
            .await
            .map_err(db_error)?;

        self.permissions()
            .create_indexes([
                IndexModel::builder().keys(doc! { "name": 1 }).options(unique("name_unique")).build(),
                IndexModel::builder().keys(doc! { "resource": 1 }).options(named("resource")).build(),
            ])
            .await
            .map_err(db_error)?;

        self.grants()
            .create_indexes([
                IndexModel::builder()
                    .keys(doc! { "role_id": 1, "permission_id": 1 })
                    .options(unique("role_permission_unique"))
                    .build(),
                IndexModel::builder().keys(doc! { "permission_id": 1 }).options(named("permission_id")).build(),
            ])
            .await
            .map_err(db_error)?;

        self.assignments()
            .create_indexes([
                IndexModel::builder()
                    .keys(doc! { "user_id": 1, "role_id": 1 })
                    .options(unique("user_role_unique"))
                    .build(),
                IndexModel::builder().keys(doc! { "role_id": 1 }).options(named("role_id")).build(),
                IndexModel::builder().keys(doc! { "expires_at": 1 }).options(named("expires_at")).build(),
            ])
            .await
            .map_err(db_error)?;

        Ok(())
    }
}
