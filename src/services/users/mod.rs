//! 사용자 관리 서비스 모듈
//!
//! 관리자 사용자 생성, 본인/관리자 프로필 수정, 비활성화와 삭제를 담당합니다.

pub mod user_service;

pub use user_service::UserService;
