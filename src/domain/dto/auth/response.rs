//! 인증 응답 DTO

use serde::{Deserialize, Serialize};

use crate::domain::dto::rbac::response::PermissionResponse;
use crate::domain::dto::users::response::UserResponse;
use crate::domain::models::token::TokenPair;

/// 토큰 쌍 응답
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// access 토큰 만료까지 남은 초
    pub expires_in: i64,
    pub refresh_expires_in: i64,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: pair.access_expires_in,
            refresh_expires_in: pair.refresh_expires_in,
        }
    }
}

/// 회원가입/로그인 응답
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub tokens: TokenResponse,
}

/// 토큰 갱신 응답
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub tokens: TokenResponse,
}

/// 내 정보 응답
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user: UserResponse,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

/// 내 권한 목록 항목
pub type PermissionInfo = PermissionResponse;
