//! # Application Error Handling System
//!
//! 백엔드 서비스 전체에서 사용하는 통합 에러 타입입니다.
//! 도메인 연산은 [`AppError`]를 반환하고, HTTP 계층은 `ResponseError` 구현을 통해
//! 표준 응답 봉투(`{success, error{type,message,details?,code?}, timestamp}`)로 변환합니다.
//!
//! ## HTTP 응답 매핑
//!
//! | AppError | HTTP Status | `error.type` |
//! |----------|-------------|--------------|
//! | `ValidationError`, `InvalidFields` | 400 | `VALIDATION_ERROR` |
//! | `NotFound` | 404 | `NOT_FOUND` |
//! | `ConflictError`, `DuplicateRequest` | 409 | `CONFLICT` |
//! | `AuthenticationError` | 401 | `UNAUTHORIZED` |
//! | `AuthorizationError` | 403 | `FORBIDDEN` |
//! | `RequestTimeout` | 408 | `INTERNAL_ERROR` (`code=REQUEST_TIMEOUT`) |
//! | `PayloadTooLarge` | 413 | `VALIDATION_ERROR` (`code=PAYLOAD_TOO_LARGE`) |
//! | `UnsupportedMediaType` | 415 | `VALIDATION_ERROR` (`code=UNSUPPORTED_MEDIA_TYPE`) |
//! | `DatabaseError`, `RedisError`, `ExternalServiceError`, `InternalError` | 500 | `INTERNAL_ERROR` |
//!
//! ## 인증 실패 사유
//!
//! 인증 실패는 내부적으로 [`AuthFailure`]로 구분되어 로그에 남지만,
//! 클라이언트에게는 하나의 `UNAUTHORIZED` 응답으로만 노출됩니다.
//! 로그인 실패 역시 "사용자 없음", "비밀번호 불일치", "비활성 계정"을 구분하지 않습니다.
//!
//! ```rust,ignore
//! use crate::core::errors::{AppError, AuthFailure};
//!
//! let claims = token_service.decode(token, TokenKind::Access)
//!     .map_err(|_| AppError::AuthenticationError(AuthFailure::InvalidToken))?;
//! ```

use std::fmt;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::Value;
use thiserror::Error;

use crate::domain::dto::api_response::{ApiResponse, ErrorBody};

/// 인증 실패의 내부 사유
///
/// 로그와 테스트에서만 구분되며 응답 본문에는 포함되지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// Authorization 헤더 또는 사용자 컨텍스트 없음
    MissingToken,
    /// 서명 불일치, 형식 오류, 토큰 종류 불일치
    InvalidToken,
    /// `exp <= now`
    Expired,
    /// 폐기 목록에 있거나 epoch가 지난 토큰
    Revoked,
    /// 비활성화된 계정
    Inactive,
    /// 로그인 자격 증명 불일치
    BadCredentials,
}

impl AuthFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthFailure::MissingToken => "missing_token",
            AuthFailure::InvalidToken => "invalid_token",
            AuthFailure::Expired => "expired",
            AuthFailure::Revoked => "revoked",
            AuthFailure::Inactive => "inactive",
            AuthFailure::BadCredentials => "bad_credentials",
        }
    }
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 애플리케이션 전역 에러 타입
///
/// 인프라 계층(`DatabaseError`, `RedisError`, `ExternalServiceError`),
/// 비즈니스 계층(`ValidationError`, `InvalidFields`, `NotFound`, `ConflictError`, `DuplicateRequest`),
/// 보안 계층(`AuthenticationError`, `AuthorizationError`),
/// 전송 계층(`RequestTimeout`, `PayloadTooLarge`, `UnsupportedMediaType`)으로 나뉩니다.
///
/// # 에러 변환 패턴
///
/// ```rust,ignore
/// // MongoDB 에러 변환
/// collection.find_one(filter).await
///     .map_err(|e| AppError::DatabaseError(e.to_string()))?;
///
/// // validator 에러는 `?`로 바로 변환되어 필드별 상세 정보를 유지합니다
/// payload.validate()?;
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// 데이터베이스 연산 실패 (500)
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Redis 연산 실패 (500)
    #[error("Redis error: {0}")]
    RedisError(String),

    /// 단일 메시지 입력값 검증 실패 (400)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 필드별 상세 정보를 가진 입력값 검증 실패 (400)
    #[error("Validation error: {0}")]
    InvalidFields(#[from] validator::ValidationErrors),

    /// 리소스 없음 (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// 유니크 제약 또는 버전 충돌 (409)
    #[error("Conflict error: {0}")]
    ConflictError(String),

    /// 이미 처리된 멱등 요청 (409)
    #[error("Duplicate request")]
    DuplicateRequest,

    /// 인증 실패 (401)
    #[error("Authentication error: {0}")]
    AuthenticationError(AuthFailure),

    /// 권한 부족 (403)
    #[error("Authorization error: {0}")]
    AuthorizationError(String),

    /// 요청 처리 기한 초과 (408)
    #[error("Request timed out")]
    RequestTimeout,

    /// 요청 본문 크기 초과 (413)
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// 지원하지 않는 Content-Type (415)
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// 외부 API 호출 실패 (500)
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// 예상하지 못한 내부 오류 (500)
    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    /// 응답 봉투의 `error.type` 값
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidFields(_)
            | AppError::PayloadTooLarge(_)
            | AppError::UnsupportedMediaType(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::ConflictError(_) | AppError::DuplicateRequest => "CONFLICT",
            AppError::AuthenticationError(_) => "UNAUTHORIZED",
            AppError::AuthorizationError(_) => "FORBIDDEN",
            AppError::RequestTimeout
            | AppError::DatabaseError(_)
            | AppError::RedisError(_)
            | AppError::ExternalServiceError(_)
            | AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// 응답 봉투의 `error.code` 값
    pub fn code(&self) -> Option<&'static str> {
        match self {
            AppError::DuplicateRequest => Some("DUPLICATE_REQUEST"),
            AppError::RequestTimeout => Some("REQUEST_TIMEOUT"),
            AppError::PayloadTooLarge(_) => Some("PAYLOAD_TOO_LARGE"),
            AppError::UnsupportedMediaType(_) => Some("UNSUPPORTED_MEDIA_TYPE"),
            _ => None,
        }
    }

    /// 클라이언트에게 노출되는 메시지
    ///
    /// 인프라 계층 에러의 원인은 로그에만 남고 여기서는 일반 메시지로 대체됩니다.
    pub fn public_message(&self) -> String {
        match self {
            AppError::ValidationError(msg)
            | AppError::NotFound(msg)
            | AppError::ConflictError(msg)
            | AppError::AuthorizationError(msg)
            | AppError::PayloadTooLarge(msg)
            | AppError::UnsupportedMediaType(msg) => msg.clone(),
            AppError::InvalidFields(_) => "입력값이 올바르지 않습니다".to_string(),
            AppError::DuplicateRequest => "Request already processed".to_string(),
            AppError::AuthenticationError(AuthFailure::BadCredentials) => {
                "이메일 또는 비밀번호가 올바르지 않습니다".to_string()
            }
            AppError::AuthenticationError(_) => "유효한 인증 정보가 필요합니다".to_string(),
            AppError::RequestTimeout => "요청 처리 시간이 초과되었습니다".to_string(),
            AppError::DatabaseError(_)
            | AppError::RedisError(_)
            | AppError::ExternalServiceError(_)
            | AppError::InternalError(_) => "서버 내부 오류가 발생했습니다".to_string(),
        }
    }

    /// 필드별 검증 상세 정보 (`{"field": ["message", ...]}`)
    pub fn details(&self) -> Option<Value> {
        let AppError::InvalidFields(errors) = self else {
            return None;
        };

        let mut details = serde_json::Map::new();
        for (field, field_errors) in errors.field_errors() {
            let messages: Vec<Value> = field_errors
                .iter()
                .map(|e| {
                    let text = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    Value::String(text)
                })
                .collect();
            details.insert(field.to_string(), Value::Array(messages));
        }
        Some(Value::Object(details))
    }

    /// 응답 봉투의 `error` 객체를 생성합니다.
    pub fn to_error_body(&self) -> ErrorBody {
        ErrorBody {
            error_type: self.error_type().to_string(),
            message: self.public_message(),
            details: self.details(),
            code: self.code().map(str::to_string),
        }
    }

    /// 인증 실패 사유 (인증 에러가 아닌 경우 `None`)
    pub fn auth_failure(&self) -> Option<AuthFailure> {
        match self {
            AppError::AuthenticationError(reason) => Some(*reason),
            _ => None,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidFields(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ConflictError(_) | AppError::DuplicateRequest => StatusCode::CONFLICT,
            AppError::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            AppError::AuthorizationError(_) => StatusCode::FORBIDDEN,
            AppError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(ApiResponse::<()>::failure(self.to_error_body()))
    }
}

/// 애플리케이션 결과 타입
pub type AppResult<T> = Result<T, AppError>;

/// 외부 에러에 문맥을 덧붙여 `InternalError`로 변환하는 확장 트레이트
pub trait ErrorContext<T> {
    fn context(self, msg: &str) -> AppResult<T>;

    fn with_context<F>(self, f: F) -> AppResult<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::fmt::Display,
{
    fn context(self, msg: &str) -> AppResult<T> {
        self.map_err(|e| AppError::InternalError(format!("{}: {}", msg, e)))
    }

    fn with_context<F>(self, f: F) -> AppResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::InternalError(format!("{}: {}", f(), e)))
    }
}
