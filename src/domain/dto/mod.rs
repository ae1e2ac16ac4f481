//! # Data Transfer Objects (DTO) Module
//!
//! API 경계에서 데이터를 전송하기 위한 객체들을 정의하는 모듈입니다.
//! 요청 DTO는 `validator`로 검증되고, 응답 DTO는 엔티티에서 민감한 필드를 제외해 만듭니다.
//!
//! ## 모듈 구조
//!
//! ```text
//! dto/
//! ├── api_response.rs   # 표준 응답 봉투
//! ├── validation.rs     # 비밀번호, 전화번호 공통 검증
//! ├── auth/             # 회원가입, 로그인, 토큰, 비밀번호 수명주기
//! ├── users/            # 사용자 관리
//! └── rbac/             # 역할, 권한, 부여, 할당
//! ```
//!
//! ## 변환 패턴
//! - **Entity → Response**: `impl From<Entity> for Response`
//! - **검증**: 서비스 진입 시 `request.validate()?` 로 필드별 에러를 `AppError::InvalidFields`로 변환

pub mod api_response;
pub mod auth;
pub mod rbac;
pub mod users;
pub mod validation;

pub use api_response::{ApiResponse, ErrorBody};
