//! # 계정 인증 흐름
//!
//! 회원가입, 로그인, 토큰 갱신, 로그아웃, 비밀번호 변경/재설정, 이메일 인증을
//! 하나의 서비스로 묶습니다. 개별 단계는 협력 서비스가 담당합니다.
//!
//! ```text
//! AuthService
//!   ├─ PasswordService      (bcrypt, 더미 해시 비교)
//!   ├─ TokenService         (발급, 검증, 회전, 폐기)
//!   ├─ VerificationService  (일회용 토큰, 메일 발송, 발송 제한)
//!   ├─ RoleService          (신규 사용자 기본 역할)
//!   └─ EventPublisher       (커밋 이후 도메인 이벤트)
//! ```
//!
//! ## 계정 열거 방지
//!
//! - 로그인 실패는 원인과 관계없이 `BadCredentials` 하나로 응답하고,
//!   존재하지 않는 이메일도 더미 해시와 비교해 응답 시간을 맞춥니다.
//! - 재설정/재발송 요청은 계정 존재 여부와 무관하게 같은 응답을 돌려줍니다.

use std::sync::Arc;

use serde_json::json;
use validator::Validate;

use crate::core::errors::{AppError, AuthFailure};
use crate::domain::dto::auth::request::{
    ChangePasswordRequest, ConfirmResetRequest, LoginRequest, RegisterRequest, VerifyEmailRequest,
};
use crate::domain::entities::tokens::TokenPurpose;
use crate::domain::entities::users::user::User;
use crate::domain::models::auth::AuthenticatedUser;
use crate::domain::models::events::{DomainEvent, EventType};
use crate::domain::models::token::{TokenKind, TokenPair};
use crate::repositories::tokens::RevocationReason;
use crate::repositories::users::CredentialStore;
use crate::services::auth::password_service::PasswordService;
use crate::services::auth::token_service::TokenService;
use crate::services::auth::verification_service::VerificationService;
use crate::services::notifications::{publish_or_log, EventPublisher};
use crate::services::rbac::RoleService;
use crate::utils::clock::Clock;

fn bad_credentials() -> AppError {
    AppError::AuthenticationError(AuthFailure::BadCredentials)
}

pub struct AuthService {
    users: Arc<dyn CredentialStore>,
    roles: Arc<RoleService>,
    passwords: Arc<PasswordService>,
    tokens: Arc<TokenService>,
    verification: Arc<VerificationService>,
    events: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn CredentialStore>,
        roles: Arc<RoleService>,
        passwords: Arc<PasswordService>,
        tokens: Arc<TokenService>,
        verification: Arc<VerificationService>,
        events: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            roles,
            passwords,
            tokens,
            verification,
            events,
            clock,
        }
    }

    /// 로컬 계정을 만들고 바로 로그인 상태의 토큰 쌍을 발급합니다.
    ///
    /// 계정은 미인증 상태로 생성되며 인증 메일이 발송됩니다.
    /// 메일 발송 실패는 가입 자체를 실패시키지 않습니다.
    ///
    /// # Errors
    ///
    /// * `AppError::InvalidFields` - 입력 검증 실패
    /// * `AppError::ConflictError` - 이미 가입된 이메일
    pub async fn register(&self, request: RegisterRequest) -> Result<(User, TokenPair), AppError> {
        request.validate()?;

        if self.users.find_by_email(&request.email).await?.is_some() {
            return Err(AppError::ConflictError("이미 등록된 이메일입니다".to_string()));
        }

        let password_hash = self.passwords.hash(&request.password).await?;
        let now = self.clock.now();
        let user = self
            .users
            .create(User::new_local(&request.email, request.name, request.phone, password_hash, now))
            .await?;

        if let Err(e) = self.roles.assign_default_role(&user.id).await {
            log::error!("기본 역할 부여 실패: user={}, {}", user.id, e);
        }

        let pair = self.tokens.issue_pair(&user)?;

        if let Err(e) = self.verification.send_verification(&user).await {
            log::error!("인증 메일 발송 실패: user={}, {}", user.id, e);
        }

        publish_or_log(
            self.events.as_ref(),
            DomainEvent::new(EventType::UserRegistered, &user.id, now).with_payload(json!({ "email": user.email })),
        )
        .await;

        log::info!("회원가입: {} ({})", user.email, user.id);
        Ok((user, pair))
    }

    /// 이메일/비밀번호 로그인
    ///
    /// # Errors
    ///
    /// * `AppError::AuthenticationError(BadCredentials)` - 이메일 없음, 비밀번호 불일치, 비활성 계정
    pub async fn login(&self, request: LoginRequest) -> Result<(User, TokenPair), AppError> {
        request.validate().map_err(|_| bad_credentials())?;

        let user = self.users.find_by_email(&request.email).await?;
        let matched = self
            .passwords
            .verify_or_dummy(&request.password, user.as_ref().map(|u| u.password_hash.as_str()))
            .await?;

        let user = match user {
            Some(user) if matched && user.is_active => user,
            Some(user) if matched => {
                log::info!("비활성 계정 로그인 시도: {}", user.id);
                return Err(bad_credentials());
            }
            _ => return Err(bad_credentials()),
        };

        let pair = self.tokens.issue_pair(&user)?;
        publish_or_log(
            self.events.as_ref(),
            DomainEvent::new(EventType::UserLoggedIn, &user.id, self.clock.now()),
        )
        .await;

        Ok((user, pair))
    }

    /// 리프레시 토큰 회전
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        let (_, pair) = self.tokens.rotate(refresh_token).await?;
        Ok(pair)
    }

    /// 현재 access 토큰을 폐기합니다. 본인의 리프레시 토큰이 함께 오면 그것도 폐기합니다.
    ///
    /// 리프레시 토큰이 유효하지 않거나 다른 사용자의 것이면 조용히 무시합니다.
    pub async fn logout(&self, user: &AuthenticatedUser, refresh_token: Option<&str>) -> Result<(), AppError> {
        self.tokens
            .revoke(&user.jti, user.token_expires_at, RevocationReason::Logout)
            .await?;

        if let Some(refresh_token) = refresh_token {
            match self.tokens.decode(refresh_token, TokenKind::Refresh) {
                Ok(claims) if claims.sub == user.user_id => {
                    self.tokens
                        .revoke(&claims.jti, claims.expires_at(), RevocationReason::Logout)
                        .await?;
                }
                Ok(claims) => log::warn!("다른 사용자의 리프레시 토큰으로 로그아웃 시도: {} != {}", claims.sub, user.user_id),
                Err(e) => log::debug!("로그아웃 리프레시 토큰 무시: {}", e),
            }
        }

        publish_or_log(
            self.events.as_ref(),
            DomainEvent::new(EventType::UserLoggedOut, &user.user_id, self.clock.now()),
        )
        .await;
        Ok(())
    }

    /// 사용자의 모든 기존 토큰을 무효화합니다.
    pub async fn logout_all(&self, user: &AuthenticatedUser) -> Result<(), AppError> {
        let epoch = self.users.increment_epoch(&user.user_id, self.clock.now()).await?;
        log::info!("전체 로그아웃: user={}, epoch={}", user.user_id, epoch);

        publish_or_log(
            self.events.as_ref(),
            DomainEvent::new(EventType::UserLoggedOut, &user.user_id, self.clock.now())
                .with_payload(json!({ "all_sessions": true })),
        )
        .await;
        Ok(())
    }

    /// 현재 사용자의 최신 상태
    pub async fn current_user(&self, user_id: &str) -> Result<User, AppError> {
        self.users.get_by_id(user_id).await
    }

    /// 비밀번호를 변경하고 기존 세션을 모두 무효화합니다.
    ///
    /// 호출자가 로그인 상태를 유지할 수 있도록 새 epoch로 발급한 토큰 쌍을 반환합니다.
    pub async fn change_password(&self, user_id: &str, request: ChangePasswordRequest) -> Result<TokenPair, AppError> {
        request.validate()?;

        let user = self.users.get_by_id(user_id).await?;
        if !self.passwords.verify(&request.old_password, &user.password_hash).await? {
            return Err(bad_credentials());
        }

        let password_hash = self.passwords.hash(&request.new_password).await?;
        let now = self.clock.now();
        let user = self.users.update_password(user_id, &password_hash, now).await?;

        publish_or_log(
            self.events.as_ref(),
            DomainEvent::new(EventType::PasswordChanged, user_id, now),
        )
        .await;

        self.tokens.issue_pair(&user)
    }

    /// 재설정 메일 요청. 결과는 계정 존재 여부와 무관합니다.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AppError> {
        self.verification.request_password_reset(email).await
    }

    /// 재설정 토큰으로 비밀번호를 교체합니다. 모든 기존 세션이 무효화됩니다.
    pub async fn confirm_password_reset(&self, request: ConfirmResetRequest) -> Result<(), AppError> {
        request.validate()?;

        let user_id = self
            .verification
            .redeem(TokenPurpose::ResetPassword, &request.token)
            .await?;

        let user = self
            .users
            .find_by_id(&user_id)
            .await?
            .filter(|user| user.is_active)
            .ok_or(AppError::AuthenticationError(AuthFailure::InvalidToken))?;

        let password_hash = self.passwords.hash(&request.new_password).await?;
        let now = self.clock.now();
        self.users.update_password(&user.id, &password_hash, now).await?;

        publish_or_log(self.events.as_ref(), DomainEvent::new(EventType::PasswordReset, &user.id, now)).await;
        log::info!("비밀번호 재설정 완료: {}", user.id);
        Ok(())
    }

    pub async fn verify_email(&self, request: VerifyEmailRequest) -> Result<User, AppError> {
        request.validate()?;

        let user_id = self
            .verification
            .redeem(TokenPurpose::VerifyEmail, &request.token)
            .await?;
        let now = self.clock.now();
        let user = self.users.mark_verified(&user_id, now).await?;

        publish_or_log(self.events.as_ref(), DomainEvent::new(EventType::EmailVerified, &user.id, now)).await;
        Ok(user)
    }

    pub async fn resend_verification(&self, email: &str) -> Result<(), AppError> {
        self.verification.request_verification_resend(email).await
    }
}
