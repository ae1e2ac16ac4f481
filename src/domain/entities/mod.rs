//! # Entities
//!
//! MongoDB에 영속되는 도메인 엔티티들입니다.
//!
//! - [`users`] - 자격 증명을 가진 사용자
//! - [`rbac`] - 역할, 권한, 부여/할당 조인 레코드
//! - [`tokens`] - 이메일 인증/비밀번호 재설정용 일회용 토큰
//! - [`inbox`] - 메시지 중복 제거 인박스 항목

pub mod inbox;
pub mod rbac;
pub mod tokens;
pub mod users;

pub use inbox::InboxEntry;
pub use rbac::{Permission, Role, RolePermission, UserRole};
pub use tokens::{OneTimeToken, TokenPurpose};
pub use users::user::{Avatar, User};
