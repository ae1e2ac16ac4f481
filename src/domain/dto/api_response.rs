//! # 표준 응답 봉투
//!
//! 모든 API 응답은 다음 형태를 따릅니다.
//!
//! ```json
//! {
//!   "success": false,
//!   "error": { "type": "VALIDATION_ERROR", "message": "입력값이 올바르지 않습니다",
//!              "details": { "password": ["비밀번호는 8-72자여야 합니다"] } },
//!   "timestamp": "2024-05-01T12:00:00Z"
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// API 응답 래퍼
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,

    pub timestamp: DateTime<Utc>,
}

/// 실패 응답의 `error` 객체
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    /// `VALIDATION_ERROR`, `NOT_FOUND`, `CONFLICT`, `UNAUTHORIZED`, `FORBIDDEN`, `INTERNAL_ERROR`
    #[serde(rename = "type")]
    pub error_type: String,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            error: None,
            meta: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::success(data)
        }
    }

    pub fn failure(error: ErrorBody) -> Self {
        Self {
            success: false,
            message: None,
            data: None,
            error: Some(error),
            meta: None,
            timestamp: Utc::now(),
        }
    }

    /// 목록 응답의 개수 등 부가 정보
    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }
}

impl ApiResponse<()> {
    /// 데이터 없이 메시지만 담은 성공 응답
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
            error: None,
            meta: None,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_serializes_error_type_as_type() {
        let body = ErrorBody {
            error_type: "CONFLICT".into(),
            message: "Request already processed".into(),
            details: None,
            code: Some("DUPLICATE_REQUEST".into()),
        };
        let json = serde_json::to_value(ApiResponse::<()>::failure(body)).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["type"], "CONFLICT");
        assert_eq!(json["error"]["message"], "Request already processed");
        assert!(json.get("data").is_none());
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_message_only_omits_data() {
        let json = serde_json::to_value(ApiResponse::message_only("ok")).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "ok");
        assert!(json.get("data").is_none());
        assert!(json.get("error").is_none());
    }
}
