//! # 사용자 관리 서비스 구현
//!
//! 관리자 API와 본인 프로필 API 뒤에서 계정을 생성, 조회, 수정, 비활성화합니다.
//!
//! ## 보안 설계 원칙
//!
//! - **bcrypt 해싱**: 관리자가 만든 계정도 회원가입과 같은 비용으로 해싱
//! - **낙관적 잠금**: 수정 요청은 마지막으로 읽은 `version`을 함께 보내야 하며,
//!   값이 다르면 `409 Conflict`
//! - **세션 무효화**: 비활성화와 삭제는 토큰 epoch를 올려 기존 토큰을 모두 무효화
//!
//! ## 상태 전이
//!
//! ```text
//! Active ──set_status(false)──▶ Inactive ──set_status(true)──▶ Active
//!    │
//!    └──delete_user──▶ Inactive (삭제 표시, 재활성화는 관리자만)
//! ```

use std::sync::Arc;

use serde_json::json;
use validator::Validate;

use crate::core::errors::AppError;
use crate::domain::dto::users::request::{CreateUserRequest, UpdateUserRequest, UpdateUserStatusRequest};
use crate::domain::entities::users::user::{Avatar, User};
use crate::domain::models::events::{DomainEvent, EventType};
use crate::repositories::users::CredentialStore;
use crate::services::auth::PasswordService;
use crate::services::notifications::{publish_or_log, EventPublisher};
use crate::services::rbac::RoleService;
use crate::utils::clock::Clock;

/// 사용자 관리 비즈니스 로직 서비스
///
/// ## 사용 예제
///
/// ```rust,ignore
/// let user = ctx.user_service.create_user(request).await?;
/// let user = ctx.user_service.update_user(&user.id, update).await?;
/// ```
pub struct UserService {
    users: Arc<dyn CredentialStore>,
    roles: Arc<RoleService>,
    passwords: Arc<PasswordService>,
    events: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn CredentialStore>,
        roles: Arc<RoleService>,
        passwords: Arc<PasswordService>,
        events: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            roles,
            passwords,
            events,
            clock,
        }
    }

    /// 관리자 계정 생성
    ///
    /// # Errors
    ///
    /// * `AppError::InvalidFields` - 입력 검증 실패
    /// * `AppError::ConflictError` - 이메일 중복
    pub async fn create_user(&self, request: CreateUserRequest) -> Result<User, AppError> {
        request.validate()?;

        if self.users.find_by_email(&request.email).await?.is_some() {
            return Err(AppError::ConflictError("이미 등록된 이메일입니다".to_string()));
        }

        let password_hash = self.passwords.hash(&request.password).await?;
        let mut user = User::new_local(&request.email, request.name, request.phone, password_hash, self.clock.now());
        user.is_verified = request.is_verified;

        let user = self.users.create(user).await?;
        if let Err(e) = self.roles.assign_default_role(&user.id).await {
            log::error!("기본 역할 부여 실패: user={}, {}", user.id, e);
        }

        log::info!("관리자 사용자 생성: {} ({})", user.email, user.id);
        Ok(user)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User, AppError> {
        self.users.get_by_id(user_id).await
    }

    /// 프로필 수정 (낙관적 잠금)
    pub async fn update_user(&self, user_id: &str, request: UpdateUserRequest) -> Result<User, AppError> {
        request.validate()?;

        let mut user = self.users.get_by_id(user_id).await?;
        if user.version != request.version {
            return Err(AppError::ConflictError(format!(
                "다른 요청이 먼저 수정했습니다 (현재 버전 {})",
                user.version
            )));
        }

        if let Some(name) = request.name {
            user.name = name.trim().to_string();
        }
        if request.phone.is_some() {
            user.phone = request.phone;
        }
        if let Some(avatar) = request.avatar {
            user.avatar = Some(Avatar {
                key: avatar.key,
                url: avatar.url,
            });
        }

        self.users.update(user, self.clock.now()).await
    }

    /// 삭제 표시 후 모든 세션을 무효화합니다.
    pub async fn delete_user(&self, user_id: &str) -> Result<User, AppError> {
        let now = self.clock.now();
        let user = self.users.soft_delete(user_id, now).await?;

        publish_or_log(
            self.events.as_ref(),
            DomainEvent::new(EventType::UserDeactivated, user_id, now).with_payload(json!({ "deleted": true })),
        )
        .await;
        log::info!("사용자 삭제: {}", user_id);
        Ok(user)
    }

    pub async fn update_status(&self, user_id: &str, request: UpdateUserStatusRequest) -> Result<User, AppError> {
        self.set_status(user_id, request.is_active).await
    }

    /// 활성 상태 변경. 비활성화하면 기존 토큰이 모두 무효화됩니다.
    pub async fn set_status(&self, user_id: &str, is_active: bool) -> Result<User, AppError> {
        let now = self.clock.now();
        let user = self.users.set_active(user_id, is_active, now).await?;

        if !is_active {
            publish_or_log(
                self.events.as_ref(),
                DomainEvent::new(EventType::UserDeactivated, user_id, now),
            )
            .await;
        }
        log::info!("사용자 상태 변경: {} → {}", user_id, if is_active { "active" } else { "inactive" });
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::testing::TestContext;
    use crate::domain::dto::users::request::AvatarRequest;
    use crate::domain::models::token::TokenKind;

    fn create_request(email: &str) -> CreateUserRequest {
        CreateUserRequest {
            email: email.to_string(),
            name: "Bob".to_string(),
            phone: None,
            password: "Passw0rd!".to_string(),
            is_verified: true,
        }
    }

    fn update_request(version: i64) -> UpdateUserRequest {
        UpdateUserRequest {
            name: Some("  Robert ".to_string()),
            phone: Some("+82 10-1234-5678".to_string()),
            avatar: Some(AvatarRequest {
                key: "avatars/bob.png".to_string(),
                url: "https://cdn.example.com/avatars/bob.png".to_string(),
            }),
            version,
        }
    }

    #[actix_web::test]
    async fn test_create_user_hashes_password_and_rejects_duplicates() {
        let ctx = TestContext::new().await;
        let service = &ctx.app.user_service;

        let user = service.create_user(create_request("bob@x.io")).await.unwrap();
        assert!(user.is_verified);
        assert!(user.password_hash.starts_with("$2"));

        let duplicate = service.create_user(create_request("BOB@x.io")).await.unwrap_err();
        assert!(matches!(duplicate, AppError::ConflictError(_)));
    }

    #[actix_web::test]
    async fn test_update_requires_current_version() {
        let ctx = TestContext::new().await;
        let service = &ctx.app.user_service;
        let user = service.create_user(create_request("bob@x.io")).await.unwrap();

        let updated = service.update_user(&user.id, update_request(user.version)).await.unwrap();
        assert_eq!(updated.name, "Robert");
        assert_eq!(updated.version, user.version + 1);
        assert_eq!(updated.avatar.as_ref().map(|a| a.key.as_str()), Some("avatars/bob.png"));

        let stale = service.update_user(&user.id, update_request(user.version)).await.unwrap_err();
        assert!(matches!(stale, AppError::ConflictError(_)));
    }

    #[actix_web::test]
    async fn test_deactivation_invalidates_tokens_until_reactivated_login() {
        let ctx = TestContext::new().await;
        let service = &ctx.app.user_service;
        let user = service.create_user(create_request("bob@x.io")).await.unwrap();
        let pair = ctx.app.token_service.issue_pair(&user).unwrap();

        service.set_status(&user.id, false).await.unwrap();
        assert!(ctx.app.token_service.validate(&pair.access_token, TokenKind::Access).await.is_err());

        let reactivated = service.set_status(&user.id, true).await.unwrap();
        assert!(reactivated.is_active);
        assert!(ctx.app.token_service.validate(&pair.access_token, TokenKind::Access).await.is_err());
    }

    #[actix_web::test]
    async fn test_delete_marks_inactive() {
        let ctx = TestContext::new().await;
        let service = &ctx.app.user_service;
        let user = service.create_user(create_request("bob@x.io")).await.unwrap();

        let deleted = service.delete_user(&user.id).await.unwrap();
        assert!(!deleted.is_active);
        assert!(matches!(service.delete_user("missing").await.unwrap_err(), AppError::NotFound(_)));
    }
}
