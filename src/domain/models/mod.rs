//! # Domain Models
//!
//! 영속되지 않는 도메인 값들입니다.
//!
//! - [`auth`] - 인증된 사용자 컨텍스트와 접근 요구사항
//! - [`token`] - JWT 클레임과 토큰 쌍
//! - [`events`] - 상태 변경 후 발행되는 도메인 이벤트

pub mod auth;
pub mod events;
pub mod token;
