//! 이메일 인증 / 비밀번호 재설정 일회용 토큰 서비스
//!
//! ## 토큰 원장
//!
//! - 256비트 난수 토큰을 발급하고 SHA-256 해시만 저장합니다
//! - 새 토큰을 발급하면 같은 사용자·용도의 미사용 토큰은 모두 사용 처리됩니다
//! - 사용은 (해시, 용도, 미사용, 미만료) 조건의 원자적 compare-and-set이므로
//!   동시에 여러 번 시도해도 최대 한 번만 성공합니다
//!
//! ## 계정 존재 여부 비노출
//!
//! 재설정 요청과 인증 메일 재발송은 이메일당 발송 제한을 먼저 적용한 뒤,
//! 사용자 조회와 발송을 백그라운드 작업으로 넘기고 즉시 반환합니다.
//! 존재하는 이메일과 없는 이메일의 응답 본문과 처리 시간이 같습니다.

use std::sync::Arc;

use chrono::Duration;

use crate::config::{EmailConfig, OneTimeTokenConfig};
use crate::core::errors::{AppError, AuthFailure};
use crate::domain::entities::tokens::{OneTimeToken, TokenPurpose};
use crate::domain::entities::users::user::User;
use crate::repositories::tokens::{OneTimeTokenStore, ThrottleStore};
use crate::repositories::users::CredentialStore;
use crate::services::notifications::{EmailMessage, EmailSender};
use crate::utils::clock::Clock;
use crate::utils::crypto::{generate_opaque_token, sha256_hex};

#[derive(Debug, Clone)]
pub struct VerificationSettings {
    pub verify_email_ttl: Duration,
    pub reset_password_ttl: Duration,
    /// 윈도우당 이메일별 최대 발송 횟수
    pub throttle_max: u64,
    pub throttle_window_secs: u64,
    /// 링크 기준 URL (끝의 `/` 없음)
    pub app_base_url: String,
}

impl VerificationSettings {
    pub fn from_env() -> Self {
        Self {
            verify_email_ttl: OneTimeTokenConfig::verify_email_ttl(),
            reset_password_ttl: OneTimeTokenConfig::reset_password_ttl(),
            throttle_max: OneTimeTokenConfig::throttle_max(),
            throttle_window_secs: OneTimeTokenConfig::throttle_window_secs(),
            app_base_url: EmailConfig::app_base_url(),
        }
    }
}

impl Default for VerificationSettings {
    fn default() -> Self {
        Self {
            verify_email_ttl: Duration::hours(24),
            reset_password_ttl: Duration::minutes(30),
            throttle_max: 3,
            throttle_window_secs: 900,
            app_base_url: "http://localhost:3000".to_string(),
        }
    }
}

pub struct VerificationService {
    users: Arc<dyn CredentialStore>,
    tokens: Arc<dyn OneTimeTokenStore>,
    throttle: Arc<dyn ThrottleStore>,
    email: Arc<dyn EmailSender>,
    clock: Arc<dyn Clock>,
    settings: VerificationSettings,
}

impl VerificationService {
    pub fn new(
        users: Arc<dyn CredentialStore>,
        tokens: Arc<dyn OneTimeTokenStore>,
        throttle: Arc<dyn ThrottleStore>,
        email: Arc<dyn EmailSender>,
        clock: Arc<dyn Clock>,
        settings: VerificationSettings,
    ) -> Self {
        Self {
            users,
            tokens,
            throttle,
            email,
            clock,
            settings,
        }
    }

    fn ttl_for(&self, purpose: TokenPurpose) -> Duration {
        match purpose {
            TokenPurpose::VerifyEmail => self.settings.verify_email_ttl,
            TokenPurpose::ResetPassword => self.settings.reset_password_ttl,
        }
    }

    /// 새 토큰을 발급하고 원문을 반환합니다. 원문은 저장되지 않습니다.
    pub async fn issue(&self, purpose: TokenPurpose, user_id: &str) -> Result<String, AppError> {
        let now = self.clock.now();
        let superseded = self.tokens.invalidate_for_user(user_id, purpose, now).await?;
        if superseded > 0 {
            log::debug!("이전 {} 토큰 {}개 무효화: user={}", purpose.as_str(), superseded, user_id);
        }

        let raw = generate_opaque_token();
        self.tokens
            .insert(OneTimeToken {
                token_hash: sha256_hex(&raw),
                purpose,
                user_id: user_id.to_string(),
                expires_at: now + self.ttl_for(purpose),
                consumed_at: None,
                created_at: now,
            })
            .await?;

        Ok(raw)
    }

    /// 토큰을 사용 처리하고 사용자 ID를 반환합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::AuthenticationError(InvalidToken)` - 없거나, 용도가 다르거나, 이미 사용했거나, 만료된 토큰
    pub async fn redeem(&self, purpose: TokenPurpose, token: &str) -> Result<String, AppError> {
        let token_hash = sha256_hex(token.trim());
        self.tokens
            .consume(&token_hash, purpose, self.clock.now())
            .await?
            .ok_or_else(|| {
                log::debug!("일회용 토큰 사용 실패: purpose={}", purpose.as_str());
                AppError::AuthenticationError(AuthFailure::InvalidToken)
            })
    }

    fn link(&self, path: &str, token: &str) -> String {
        format!("{}/{}?token={}", self.settings.app_base_url, path, urlencoding::encode(token))
    }

    /// 인증 메일 발송 (가입 직후)
    pub async fn send_verification(&self, user: &User) -> Result<(), AppError> {
        let token = self.issue(TokenPurpose::VerifyEmail, &user.id).await?;
        let link = self.link("verify-email", &token);
        let hours = self.settings.verify_email_ttl.num_hours();

        self.email
            .send(EmailMessage {
                to: user.email.clone(),
                subject: "이메일 주소를 인증해주세요".to_string(),
                text: format!(
                    "{}님, 아래 링크로 이메일 주소를 인증해주세요. 링크는 {}시간 동안 유효합니다.\n{}",
                    user.name, hours, link
                ),
                action_url: Some(link),
            })
            .await
    }

    pub async fn send_password_reset(&self, user: &User) -> Result<(), AppError> {
        let token = self.issue(TokenPurpose::ResetPassword, &user.id).await?;
        let link = self.link("reset-password", &token);
        let minutes = self.settings.reset_password_ttl.num_minutes();

        self.email
            .send(EmailMessage {
                to: user.email.clone(),
                subject: "비밀번호 재설정 안내".to_string(),
                text: format!(
                    "{}님, 아래 링크에서 새 비밀번호를 설정해주세요. 링크는 {}분 동안 유효합니다.\n\
                     요청하지 않았다면 이 메일을 무시하세요.\n{}",
                    user.name, minutes, link
                ),
                action_url: Some(link),
            })
            .await
    }

    /// 이메일별 발송 제한. 한도 안이면 `true`
    async fn within_limit(&self, purpose: TokenPurpose, email: &str) -> Result<bool, AppError> {
        let key = format!("{}:{}", purpose.as_str(), email);
        let count = self.throttle.hit(&key, self.settings.throttle_window_secs).await?;
        Ok(count <= self.settings.throttle_max)
    }

    /// 비밀번호 재설정 요청. 계정 존재 여부와 무관하게 같은 결과를 반환합니다.
    pub async fn request_password_reset(self: &Arc<Self>, email: &str) -> Result<(), AppError> {
        if !self.within_limit(TokenPurpose::ResetPassword, email).await? {
            log::warn!("비밀번호 재설정 요청 제한 초과: {}", email);
            return Ok(());
        }

        let this = Arc::clone(self);
        let email = email.to_string();
        actix_web::rt::spawn(async move {
            if let Err(e) = this.deliver_password_reset(&email).await {
                log::error!("비밀번호 재설정 메일 처리 실패: {}", e);
            }
        });
        Ok(())
    }

    /// 인증 메일 재발송 요청. 계정 존재 여부와 무관하게 같은 결과를 반환합니다.
    pub async fn request_verification_resend(self: &Arc<Self>, email: &str) -> Result<(), AppError> {
        if !self.within_limit(TokenPurpose::VerifyEmail, email).await? {
            log::warn!("인증 메일 재발송 제한 초과: {}", email);
            return Ok(());
        }

        let this = Arc::clone(self);
        let email = email.to_string();
        actix_web::rt::spawn(async move {
            if let Err(e) = this.deliver_verification_resend(&email).await {
                log::error!("인증 메일 재발송 처리 실패: {}", e);
            }
        });
        Ok(())
    }

    async fn deliver_password_reset(&self, email: &str) -> Result<(), AppError> {
        match self.users.find_by_email(email).await? {
            Some(user) if user.is_active => self.send_password_reset(&user).await,
            _ => Ok(()),
        }
    }

    async fn deliver_verification_resend(&self, email: &str) -> Result<(), AppError> {
        match self.users.find_by_email(email).await? {
            Some(user) if user.is_active && !user.is_verified => self.send_verification(&user).await,
            _ => Ok(()),
        }
    }
}
