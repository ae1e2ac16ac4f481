//! 사용자 관리 요청 DTO

use serde::Deserialize;
use validator::Validate;

use crate::domain::dto::validation::{validate_password_policy, validate_phone};
use crate::utils::string_utils::{deserialize_normalized_email, deserialize_optional_string};

/// 관리자 사용자 생성 요청
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserRequest {
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

    /// 관리자가 생성한 계정은 인증 완료 상태로 만들 수 있습니다.
    #[serde(default)]
    pub is_verified: bool,
}

/// 프로필 이미지 참조
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AvatarRequest {
    #[validate(length(min = 1, max = 512, message = "이미지 키가 필요합니다"))]
    pub key: String,

    #[validate(url(message = "유효한 URL 형식이 아닙니다"))]
    pub url: String,
}

/// 사용자 수정 요청 (낙관적 잠금)
///
/// `version`은 클라이언트가 마지막으로 읽은 값이어야 합니다.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100, message = "이름은 1-100자여야 합니다"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "deserialize_optional_string")]
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,

    #[validate(nested)]
    pub avatar: Option<AvatarRequest>,

    #[validate(range(min = 1, message = "버전은 1 이상이어야 합니다"))]
    pub version: i64,
}

/// 계정 활성 상태 변경 요청
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserStatusRequest {
    pub is_active: bool,
}
