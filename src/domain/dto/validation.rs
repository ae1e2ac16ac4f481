//! DTO 공통 검증 함수

use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

pub const PASSWORD_MIN_CHARS: usize = 8;
pub const PASSWORD_MAX_CHARS: usize = 72;

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+?[0-9][0-9 \-]{6,19}$").unwrap_or_else(|e| panic!("invalid phone regex: {e}"))
});

/// 비밀번호 정책: 문자 수 기준 8-72자
///
/// 바이트 길이는 제한하지 않습니다. `PasswordService`가 bcrypt 전에 SHA-256으로 줄입니다.
pub fn validate_password_policy(password: &str) -> Result<(), ValidationError> {
    let chars = password.chars().count();
    if !(PASSWORD_MIN_CHARS..=PASSWORD_MAX_CHARS).contains(&chars) {
        return Err(ValidationError::new("password_length")
            .with_message("비밀번호는 8-72자여야 합니다".into()));
    }
    Ok(())
}

/// 국제 형식 허용 (`+82 10-1234-5678`)
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if !PHONE_RE.is_match(phone) {
        return Err(ValidationError::new("invalid_phone")
            .with_message("유효한 전화번호 형식이 아닙니다".into()));
    }
    Ok(())
}
