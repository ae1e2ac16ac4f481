//! # HTTP Request Handlers Module
//!
//! 요청을 DTO로 받아 서비스 호출 결과를 [`ApiResponse`](crate::domain::dto::api_response::ApiResponse)
//! 봉투로 돌려주는 얇은 계층입니다.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//!   Middlewares - 요청 ID, 기한, 멱등성, 인증/인가
//! ├─────────────────────────────────────────────┤
//!   Handlers (이 모듈) - HTTP 엔드포인트 처리      ← Web Layer
//! ├─────────────────────────────────────────────┤
//!   Services - 비즈니스 로직                      ← Service Layer
//! ├─────────────────────────────────────────────┤
//!   Repositories - 저장소 트레이트 구현           ← Repository Layer
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## 모듈 구성
//!
//! - **`auth`**: 회원가입, 로그인, 토큰 갱신, 로그아웃, 계정 복구, 내 정보
//! - **`users`**: 관리자/본인 사용자 관리
//! - **`rbac`**: 역할, 권한, 부여, 할당 관리
//! - **`jwks`**: RS256 공개키 게시
//! - **`health`**: 헬스체크
//!
//! ## 핸들러 작성 규칙
//!
//! 서비스는 `web::Data`로 주입받고, 에러는 `?`로 전파해 `AppError`의
//! `ResponseError` 구현이 상태 코드와 봉투를 만들게 합니다.
//!
//! ```rust,ignore
//! #[get("/{user_id}", wrap = "Authorize::ownership(\"user_id\")")]
//! pub async fn get_user(
//!     users: web::Data<UserService>,
//!     user_id: web::Path<String>,
//! ) -> Result<HttpResponse, AppError> {
//!     let user = users.get_user(&user_id).await?;
//!     Ok(HttpResponse::Ok().json(ApiResponse::success(UserResponse::from(user))))
//! }
//! ```

pub mod auth;
pub mod health;
pub mod jwks;
pub mod rbac;
pub mod users;
