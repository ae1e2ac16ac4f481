//! 비즈니스 로직을 담당하는 서비스 계층 모듈
//!
//! 서비스는 저장소 트레이트(`Arc<dyn ...Store>`)와 [`Clock`](crate::utils::clock::Clock)을
//! 생성자로 받습니다. 조립은 [`AppContext`](crate::core::context::AppContext)가 한 곳에서 수행합니다.
//!
//! - [`auth`] - 토큰, 비밀번호, 계정 인증 흐름
//! - [`rbac`] - 권한 판단과 역할/권한 관리
//! - [`users`] - 관리자 사용자 관리
//! - [`inbox`] - 멱등 처리 기록과 주기적 정리
//! - [`notifications`] - 메일 발송과 도메인 이벤트

pub mod auth;
pub mod inbox;
pub mod notifications;
pub mod rbac;
pub mod users;
