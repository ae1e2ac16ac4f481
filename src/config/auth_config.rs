//! # Authentication Configuration Module
//!
//! JWT 토큰, 일회용 토큰(이메일 인증/비밀번호 재설정), 멱등성 인박스,
//! 이메일 발송 등 인증 관련 설정을 관리하는 모듈입니다.
//!
//! ## 필수 환경 변수 설정
//!
//! ### JWT 토큰 설정
//! ```bash
//! export JWT_ALGORITHM="HS256"             # 또는 RS256
//! export JWT_SECRET="your-super-secret-jwt-key"
//! export JWT_PRIVATE_KEY_PATH="/etc/keys/jwt.pem"   # RS256 전용
//! export JWT_ACCESS_TTL_MINUTES="15"
//! export JWT_REFRESH_TTL_DAYS="14"
//! ```
//!
//! ### 일회용 토큰 / 이메일
//! ```bash
//! export VERIFY_EMAIL_TTL_HOURS="24"
//! export RESET_PASSWORD_TTL_MINUTES="30"
//! export EMAIL_THROTTLE_MAX="3"
//! export EMAIL_THROTTLE_WINDOW_SECS="900"
//! export EMAIL_API_URL="https://mail.internal/api/send"
//! export APP_BASE_URL="https://app.example.com"
//! ```
//!
//! ## 사용 예제
//!
//! ```rust,ignore
//! use crate::config::{JwtConfig, OneTimeTokenConfig};
//!
//! let access_ttl = JwtConfig::access_ttl();
//! let reset_ttl = OneTimeTokenConfig::reset_password_ttl();
//! ```

use std::env;

use chrono::Duration;

use crate::config::data_config::env_or;

/// 토큰 서명 알고리즘
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenAlgorithm {
    /// HMAC-SHA256 (공유 비밀키)
    Hs256,
    /// RSA-SHA256 (개인키 서명, JWKS 공개)
    Rs256,
}

impl TokenAlgorithm {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "RS256" => TokenAlgorithm::Rs256,
            _ => TokenAlgorithm::Hs256,
        }
    }
}

/// JWT 토큰 설정
pub struct JwtConfig;

impl JwtConfig {
    pub fn algorithm() -> TokenAlgorithm {
        TokenAlgorithm::from_str(&env::var("JWT_ALGORITHM").unwrap_or_else(|_| "HS256".to_string()))
    }

    pub fn secret() -> String {
        env::var("JWT_SECRET").unwrap_or_else(|_| {
            log::warn!("JWT_SECRET not set, using default (not secure for production!)");
            "your-secret-key".to_string()
        })
    }

    /// RS256 개인키 PEM 경로 (PKCS#1 또는 PKCS#8)
    pub fn private_key_path() -> Option<String> {
        env::var("JWT_PRIVATE_KEY_PATH").ok().filter(|p| !p.trim().is_empty())
    }

    pub fn issuer() -> String {
        env::var("JWT_ISSUER").unwrap_or_else(|_| "account-service".to_string())
    }

    /// 액세스 토큰 수명. 기본값: 15분
    pub fn access_ttl() -> Duration {
        Duration::minutes(env_or("JWT_ACCESS_TTL_MINUTES", 15i64).max(1))
    }

    /// 리프레시 토큰 수명. 기본값: 14일
    pub fn refresh_ttl() -> Duration {
        Duration::days(env_or("JWT_REFRESH_TTL_DAYS", 14i64).max(1))
    }

    /// 회전된 리프레시 토큰 재사용 시 사용자 epoch를 올려 모든 세션을 끊을지 여부
    pub fn revoke_family_on_reuse() -> bool {
        env_or("REFRESH_REUSE_REVOKES_FAMILY", false)
    }
}

/// 일회용 토큰 및 발송 제한 설정
pub struct OneTimeTokenConfig;

impl OneTimeTokenConfig {
    pub fn verify_email_ttl() -> Duration {
        Duration::hours(env_or("VERIFY_EMAIL_TTL_HOURS", 24i64).max(1))
    }

    pub fn reset_password_ttl() -> Duration {
        Duration::minutes(env_or("RESET_PASSWORD_TTL_MINUTES", 30i64).max(1))
    }

    /// 이메일당 윈도우 내 최대 발송 횟수
    pub fn throttle_max() -> u64 {
        env_or("EMAIL_THROTTLE_MAX", 3u64).max(1)
    }

    pub fn throttle_window_secs() -> u64 {
        env_or("EMAIL_THROTTLE_WINDOW_SECS", 900u64).max(1)
    }
}

/// 멱등성 인박스 설정
pub struct IdempotencyConfig;

impl IdempotencyConfig {
    /// 인박스 항목 보존 기간. 기본값: 24시간
    pub fn ttl() -> Duration {
        Duration::seconds(env_or("IDEMPOTENCY_TTL_SECS", 86_400i64).max(1))
    }

    /// 만료 항목 정리 주기(초). 기본값: 300
    pub fn sweep_interval_secs() -> u64 {
        env_or("INBOX_SWEEP_INTERVAL_SECS", 300u64).max(1)
    }
}

/// 이메일 발송 설정
pub struct EmailConfig;

impl EmailConfig {
    /// 외부 메일 API 주소. 없으면 로그 발송기를 사용합니다.
    pub fn api_url() -> Option<String> {
        env::var("EMAIL_API_URL").ok().filter(|u| !u.trim().is_empty())
    }

    pub fn api_key() -> Option<String> {
        env::var("EMAIL_API_KEY").ok().filter(|k| !k.trim().is_empty())
    }

    pub fn from_address() -> String {
        env::var("EMAIL_FROM").unwrap_or_else(|_| "no-reply@localhost".to_string())
    }

    /// 인증/재설정 링크의 기준 URL
    pub fn app_base_url() -> String {
        env::var("APP_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string()
    }
}

/// 기동 시 시드 설정
pub struct BootstrapConfig;

impl BootstrapConfig {
    /// 기동 시 ADMIN 역할을 부여할 기존 사용자 이메일
    pub fn admin_email() -> Option<String> {
        env::var("BOOTSTRAP_ADMIN_EMAIL").ok().filter(|e| !e.trim().is_empty())
    }
}
