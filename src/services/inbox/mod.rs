//! 메시지 중복 제거 및 백그라운드 정리 서비스
//!
//! - [`inbox_service`] - `(message_id, consumer_id)` 기반 중복 제거
//! - [`sweeper`] - 만료 인박스 항목, 만료 역할 할당, 만료 일회용 토큰 정리

pub mod inbox_service;
pub mod sweeper;

pub use inbox_service::{InboxService, HTTP_CONSUMER_ID};
pub use sweeper::MaintenanceSweeper;
