//! 미들웨어 모듈
//!
//! 요청 처리 파이프라인의 횡단 관심사를 담당합니다.
//!
//! # 제공 미들웨어
//!
//! | 미들웨어 | 범위 | 역할 |
//! |----------|------|------|
//! | [`RequestIdMiddleware`] | 앱 | `X-Request-ID` 수용/생성, 5xx 로그 |
//! | [`RequestTimeout`] | 앱 | 처리 기한 초과 시 408 |
//! | [`Idempotency`] | 스코프/리소스 | `Idempotency-Key` 중복 쓰기 요청 409 (인증 안쪽) |
//! | [`AuthMiddleware`] | 스코프 | Bearer 토큰 검증, `AuthenticatedUser` 주입 |
//! | [`Authorize`] | 리소스 | 권한/역할/소유권 검사 |
//!
//! # 사용 방법
//!
//! ```rust,ignore
//! App::new()
//!     .wrap(RequestTimeout::new(ServerConfig::request_timeout()))
//!     .wrap(RequestIdMiddleware)
//!     .service(
//!         web::scope("/api/v1/rbac")
//!             .wrap(Idempotency)
//!             .wrap(AuthMiddleware::required())
//!             .service(handlers::rbac::list_roles), // wrap = "Authorize::permission(\"roles\", \"read\")"
//!     )
//! ```
//!
//! `Authorize`는 `AuthMiddleware`가 extensions에 넣은 사용자를 읽으므로
//! 반드시 인증 미들웨어 안쪽에 위치해야 합니다.

pub mod auth_middleware;
mod auth_inner;
pub mod authorize;
pub mod idempotency;
pub mod request_id;
pub mod timeout;

// 미들웨어 재export
pub use auth_middleware::AuthMiddleware;
pub use authorize::Authorize;
pub use idempotency::{Idempotency, IDEMPOTENCY_KEY_HEADER};
pub use request_id::{RequestId, RequestIdMiddleware, REQUEST_ID_HEADER};
pub use timeout::RequestTimeout;
