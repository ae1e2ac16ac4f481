//! 프로세스 내 자격 증명 저장소
//!
//! 단일 뮤텍스 아래에서 읽기-비교-쓰기를 수행하므로 MongoDB 구현과 같은
//! 유니크/버전 의미를 가집니다.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::errors::AppError;
use crate::domain::entities::users::user::User;
use crate::repositories::lock_poisoned;
use crate::repositories::users::{CredentialStore, EMAIL_CONFLICT, VERSION_CONFLICT};
use crate::utils::string_utils::normalize_email;

#[derive(Default)]
pub struct InMemoryCredentialStore {
    users: Mutex<HashMap<String, User>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn modify<F>(&self, id: &str, now: DateTime<Utc>, change: F) -> Result<User, AppError>
    where
        F: FnOnce(&mut User),
    {
        let mut users = self.users.lock().map_err(lock_poisoned)?;
        let user = users
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound("사용자를 찾을 수 없습니다".to_string()))?;
        change(user);
        user.version += 1;
        user.updated_at = now;
        Ok(user.clone())
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn create(&self, mut user: User) -> Result<User, AppError> {
        user.email = normalize_email(&user.email);
        let mut users = self.users.lock().map_err(lock_poisoned)?;
        if users.values().any(|existing| existing.email == user.email) {
            return Err(AppError::ConflictError(EMAIL_CONFLICT.to_string()));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        let users = self.users.lock().map_err(lock_poisoned)?;
        Ok(users.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = normalize_email(email);
        let users = self.users.lock().map_err(lock_poisoned)?;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn update(&self, user: User, now: DateTime<Utc>) -> Result<User, AppError> {
        let mut users = self.users.lock().map_err(lock_poisoned)?;
        let stored = users
            .get_mut(&user.id)
            .ok_or_else(|| AppError::NotFound("사용자를 찾을 수 없습니다".to_string()))?;

        if stored.version != user.version {
            return Err(AppError::ConflictError(VERSION_CONFLICT.to_string()));
        }

        stored.name = user.name;
        stored.phone = user.phone;
        stored.avatar = user.avatar;
        stored.version += 1;
        stored.updated_at = now;
        Ok(stored.clone())
    }

    async fn set_active(&self, id: &str, active: bool, now: DateTime<Utc>) -> Result<User, AppError> {
        self.modify(id, now, |user| {
            user.is_active = active;
            if !active {
                user.token_epoch += 1;
            }
        })
    }

    async fn mark_verified(&self, id: &str, now: DateTime<Utc>) -> Result<User, AppError> {
        self.modify(id, now, |user| user.is_verified = true)
    }

    async fn update_password(&self, id: &str, password_hash: &str, now: DateTime<Utc>) -> Result<User, AppError> {
        self.modify(id, now, |user| {
            user.password_hash = password_hash.to_string();
            user.token_epoch += 1;
        })
    }

    async fn increment_epoch(&self, id: &str, now: DateTime<Utc>) -> Result<i64, AppError> {
        self.modify(id, now, |user| user.token_epoch += 1)
            .map(|user| user.token_epoch)
    }
}
