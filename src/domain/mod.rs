//! # Domain Layer
//!
//! - [`entities`] - MongoDB에 저장되는 엔티티
//! - [`dto`] - HTTP 요청/응답 계약
//! - [`models`] - 토큰 클레임, 인증 컨텍스트, 이벤트 등 비영속 값

pub mod dto;
pub mod entities;
pub mod models;
