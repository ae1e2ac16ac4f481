//! 인가 미들웨어가 검사하는 접근 요구사항

use actix_web::http::Method;

/// 라우트별 접근 요구사항
///
/// 모든 요구사항은 인증 이후에 평가되며, 사용자 컨텍스트가 없으면 401,
/// 검사에 실패하면 403으로 거부됩니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessRequirement {
    /// `resource:action` 권한 보유
    Permission { resource: String, action: String },
    /// 역할 보유
    Role(String),
    /// 나열된 역할 중 하나 이상 보유
    AnyRole(Vec<String>),
    /// URL 파라미터가 본인 ID이거나 관리자
    Ownership { param: String },
    /// URL 경로와 HTTP 메서드에서 유도한 권한
    Dynamic,
}

impl AccessRequirement {
    pub fn describe(&self) -> String {
        match self {
            AccessRequirement::Permission { resource, action } => format!("permission {}:{}", resource, action),
            AccessRequirement::Role(role) => format!("role {}", role),
            AccessRequirement::AnyRole(roles) => format!("any role of [{}]", roles.join(", ")),
            AccessRequirement::Ownership { param } => format!("ownership of '{}'", param),
            AccessRequirement::Dynamic => "dynamic permission".to_string(),
        }
    }
}

/// HTTP 메서드 → 권한 동작
///
/// GET→read, POST→create, PUT/PATCH→update, DELETE→delete. 그 외 메서드는 매핑되지 않습니다.
pub fn action_for_method(method: &Method) -> Option<&'static str> {
    match *method {
        Method::GET | Method::HEAD => Some("read"),
        Method::POST => Some("create"),
        Method::PUT | Method::PATCH => Some("update"),
        Method::DELETE => Some("delete"),
        _ => None,
    }
}

/// 경로에서 리소스 이름을 유도합니다.
///
/// API 버전 접두사(`/api/v1`)를 건너뛴 첫 번째 세그먼트를 사용합니다.
/// `/api/v1/users/42` → `users`
pub fn resource_from_path(path: &str) -> Option<String> {
    let mut segments = path.split('/').filter(|segment| !segment.is_empty());
    let mut candidate = segments.next()?;
    if candidate == "api" {
        candidate = segments.next()?;
    }
    if candidate.len() > 1 && candidate.starts_with('v') && candidate[1..].chars().all(|c| c.is_ascii_digit()) {
        candidate = segments.next()?;
    }
    Some(candidate.replace('-', "_").to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_mapping() {
        assert_eq!(action_for_method(&Method::GET), Some("read"));
        assert_eq!(action_for_method(&Method::POST), Some("create"));
        assert_eq!(action_for_method(&Method::PUT), Some("update"));
        assert_eq!(action_for_method(&Method::PATCH), Some("update"));
        assert_eq!(action_for_method(&Method::DELETE), Some("delete"));
        assert_eq!(action_for_method(&Method::OPTIONS), None);
    }

    #[test]
    fn test_resource_from_path() {
        assert_eq!(resource_from_path("/api/v1/users"), Some("users".to_string()));
        assert_eq!(resource_from_path("/api/v1/users/42/status"), Some("users".to_string()));
        assert_eq!(resource_from_path("/articles/7"), Some("articles".to_string()));
        assert_eq!(resource_from_path("/api/v2/user-roles"), Some("user_roles".to_string()));
        assert_eq!(resource_from_path("/api/v1"), None);
        assert_eq!(resource_from_path("/"), None);
    }
}
