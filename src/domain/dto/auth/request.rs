//! 인증 요청 DTO
//!
//! 이메일 필드는 역직렬화 단계에서 정규화되므로 검증기와 서비스는 항상 소문자 이메일을 봅니다.

use serde::Deserialize;
use validator::Validate;

use crate::domain::dto::validation::{validate_password_policy, validate_phone};
use crate::utils::string_utils::{deserialize_normalized_email, deserialize_optional_string};

/// 회원가입 요청
///
/// ```json
/// { "email": "a@x.io", "name": "Alice", "password": "Passw0rd!" }
/// ```
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(deserialize_with = "deserialize_normalized_email")]
    #[validate(email(message = "유효한 이메일 주소를 입력해주세요"))]
    pub email: String,

    #[validate(length(min = 1, max = 100, message = "이름은 1-100자여야 합니다"))]
    pub name: String,

    #[serde(default, deserialize_with = "deserialize_optional_string")]
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,

    #[validate(custom(function = "validate_password_policy"))]
    pub password: String,
}

/// 로그인 요청
///
/// 비밀번호 정책은 검사하지 않습니다. 정책 위반도 일반 로그인 실패로 처리됩니다.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(deserialize_with = "deserialize_normalized_email")]
    #[validate(email(message = "유효한 이메일 주소를 입력해주세요"))]
    pub email: String,

    #[validate(length(min = 1, message = "비밀번호를 입력해주세요"))]
    pub password: String,
}

/// 리프레시 토큰 요청
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "리프레시 토큰이 필요합니다"))]
    pub refresh_token: String,
}

/// 로그아웃 요청 (본문 생략 가능)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogoutRequest {
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub refresh_token: Option<String>,
}

/// 이메일 인증 요청
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VerifyEmailRequest {
    #[validate(length(min = 1, message = "인증 토큰이 필요합니다"))]
    pub token: String,
}

/// 비밀번호 재설정 요청 및 인증 메일 재발송 요청
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EmailRequest {
    #[serde(deserialize_with = "deserialize_normalized_email")]
    #[validate(email(message = "유효한 이메일 주소를 입력해주세요"))]
    pub email: String,
}

/// 비밀번호 재설정 확정 요청
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ConfirmResetRequest {
    #[validate(length(min = 1, message = "재설정 토큰이 필요합니다"))]
    pub token: String,

    #[validate(custom(function = "validate_password_policy"))]
    pub new_password: String,
}

/// 비밀번호 변경 요청
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "현재 비밀번호를 입력해주세요"))]
    pub old_password: String,

    #[validate(custom(function = "validate_password_policy"))]
    pub new_password: String,
}
