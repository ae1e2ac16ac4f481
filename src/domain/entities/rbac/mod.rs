//! RBAC Entity Module
//!
//! 역할, 권한, 그리고 두 개의 조인 레코드(역할-권한 부여, 사용자-역할 할당)입니다.

pub mod permission;
pub mod role;
pub mod role_permission;
pub mod user_role;

pub use permission::Permission;
pub use role::Role;
pub use role_permission::RolePermission;
pub use user_role::UserRole;
