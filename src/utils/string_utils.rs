//! # 문자열 유틸리티
//!
//! 문자열 처리와 관련된 공통 유틸리티 함수들입니다.

use serde::Deserialize;

use crate::core::errors::AppError;

/// 필수 문자열을 검증하고 앞뒤 공백을 제거합니다.
///
/// # Errors
///
/// 공백만 있거나 빈 문자열이면 `ValidationError`
pub fn validate_required_string(value: &str, field_name: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::ValidationError(format!("{}은(는) 필수입니다", field_name)));
    }
    Ok(trimmed.to_string())
}

/// 선택적 문자열을 정리합니다. 공백뿐인 값은 `None`이 됩니다.
pub fn clean_optional_string(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// 이메일 정규화: 앞뒤 공백 제거 후 소문자 변환
///
/// 모든 조회와 저장 전에 적용됩니다.
///
/// ```rust,ignore
/// assert_eq!(normalize_email("  Alice@X.COM "), "alice@x.com");
/// ```
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// serde 역직렬화 시 선택적 문자열 정리
pub fn deserialize_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(clean_optional_string(opt))
}

/// serde 역직렬화 시 이메일 정규화
///
/// 검증기가 정규화된 값을 보도록 DTO 단계에서 적용합니다.
pub fn deserialize_normalized_email<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(normalize_email(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_required_string() {
        assert_eq!(validate_required_string("Hello", "name").unwrap(), "Hello");
        assert_eq!(validate_required_string("  World  ", "name").unwrap(), "World");

        assert!(validate_required_string("", "name").is_err());
        assert!(validate_required_string("   ", "name").is_err());
        assert!(validate_required_string("\t\n", "name").is_err());
    }

    #[test]
    fn test_clean_optional_string() {
        assert_eq!(clean_optional_string(Some("  World  ".to_string())), Some("World".to_string()));
        assert_eq!(clean_optional_string(Some("   ".to_string())), None);
        assert_eq!(clean_optional_string(None), None);
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@X.COM "), "alice@x.com");
        assert_eq!(normalize_email("alice@x.com"), "alice@x.com");
    }

    #[test]
    fn test_deserialize_helpers() {
        #[derive(Deserialize)]
        struct Probe {
            #[serde(deserialize_with = "deserialize_normalized_email")]
            email: String,
            #[serde(default, deserialize_with = "deserialize_optional_string")]
            phone: Option<String>,
        }

        let probe: Probe = serde_json::from_str(r#"{"email": "  Alice@X.COM ", "phone": "  "}"#).unwrap();
        assert_eq!(probe.email, "alice@x.com");
        assert_eq!(probe.phone, None);

        let probe: Probe = serde_json::from_str(r#"{"email": "b@y.io"}"#).unwrap();
        assert_eq!(probe.phone, None);

        let probe: Probe = serde_json::from_str(r#"{"email": "b@y.io", "phone": " 안녕 010 "}"#).unwrap();
        assert_eq!(probe.phone.as_deref(), Some("안녕 010"));
    }
}
