//! 역할 기반 접근 제어 서비스
//!
//! - [`authorization_service`] - 권한/역할 보유 판단 (Authorizer)
//! - [`role_service`] - 역할, 권한, 부여, 할당 관리와 기본 시드

pub mod authorization_service;
pub mod role_service;

pub use authorization_service::AuthorizationService;
pub use role_service::RoleService;
