//! # Credential Store
//!
//! 사용자 자격 증명 저장소 계약과 구현체들입니다.
//!
//! - [`user_repo::UserRepository`] - MongoDB 구현 (`users` 컬렉션)
//! - [`memory::InMemoryCredentialStore`] - 프로세스 내 구현 (`STORAGE_BACKEND=memory`, 테스트)
//!
//! ## 낙관적 잠금
//!
//! 모든 변경은 `version`을 1 증가시킵니다. [`CredentialStore::update`]는 호출자가 제시한
//! `version`이 현재 값과 같을 때만 성공하며, 다르면 `ConflictError`를 반환합니다.
//! 두 갱신이 같은 버전으로 커밋되는 일은 없습니다.

pub mod memory;
pub mod user_repo;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::errors::AppError;
use crate::domain::entities::users::user::User;

pub use memory::InMemoryCredentialStore;
pub use user_repo::UserRepository;

pub(crate) const EMAIL_CONFLICT: &str = "이미 사용 중인 이메일입니다";
pub(crate) const VERSION_CONFLICT: &str = "다른 요청이 먼저 사용자 정보를 변경했습니다";

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// 새 사용자 저장. 이메일이 이미 있으면 `ConflictError`
    async fn create(&self, user: User) -> Result<User, AppError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;

    /// 이메일은 호출 전에 정규화되어 있어야 합니다.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// 프로필 필드(name, phone, avatar) 갱신
    ///
    /// `user.version`은 호출자가 읽은 버전이며, 저장된 문서는 `version + 1`이 됩니다.
    async fn update(&self, user: User, now: DateTime<Utc>) -> Result<User, AppError>;

    /// 비활성화하고 epoch를 올려 기존 토큰을 모두 무효화합니다.
    async fn soft_delete(&self, id: &str, now: DateTime<Utc>) -> Result<User, AppError> {
        self.set_active(id, false, now).await
    }

    /// 활성 상태 변경. 비활성화할 때는 epoch도 함께 증가합니다.
    async fn set_active(&self, id: &str, active: bool, now: DateTime<Utc>) -> Result<User, AppError>;

    async fn mark_verified(&self, id: &str, now: DateTime<Utc>) -> Result<User, AppError>;

    /// 비밀번호 해시 교체와 epoch 증가를 한 번의 원자적 쓰기로 수행합니다.
    async fn update_password(&self, id: &str, password_hash: &str, now: DateTime<Utc>) -> Result<User, AppError>;

    /// 토큰 epoch를 원자적으로 1 증가시키고 새 값을 반환합니다.
    async fn increment_epoch(&self, id: &str, now: DateTime<Utc>) -> Result<i64, AppError>;

    async fn get_by_id(&self, id: &str) -> Result<User, AppError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("사용자를 찾을 수 없습니다".to_string()))
    }

    async fn get_by_email(&self, email: &str) -> Result<User, AppError> {
        self.find_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("사용자를 찾을 수 없습니다".to_string()))
    }

    /// 저장소 인덱스 생성 (필요한 구현만)
    async fn create_indexes(&self) -> Result<(), AppError> {
        Ok(())
    }
}
