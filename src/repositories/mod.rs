//! # Repository Layer
//!
//! 저장소 계약(`async_trait` 트레이트)과 구현체들입니다.
//!
//! | 계약 | MongoDB/Redis 구현 | 프로세스 내 구현 |
//! |------|-------------------|-----------------|
//! | [`users::CredentialStore`] | `UserRepository` | `InMemoryCredentialStore` |
//! | [`rbac::RbacStore`] | `RbacRepository` | `InMemoryRbacStore` |
//! | [`tokens::RevocationStore`], [`tokens::ThrottleStore`] | `TokenRepository` (Redis) | `InMemoryRevocationStore`, `InMemoryThrottleStore` |
//! | [`tokens::OneTimeTokenStore`] | `OneTimeTokenRepository` | `InMemoryOneTimeTokenStore` |
//! | [`inbox::InboxStore`] | `InboxRepository` | `InMemoryInboxStore` |
//!
//! MongoDB/Redis 구현은 `#[repository]` 매크로로 선언된 싱글톤이며,
//! `Database`와 `RedisClient`가 `ServiceLocator`에 등록된 뒤에 생성됩니다.

pub mod inbox;
pub mod rbac;
pub mod tokens;
pub mod users;

use std::sync::PoisonError;

use crate::core::errors::AppError;

/// 프로세스 내 저장소의 뮤텍스가 오염된 경우
pub(crate) fn lock_poisoned<T>(_: PoisonError<T>) -> AppError {
    AppError::InternalError("저장소 잠금이 손상되었습니다".to_string())
}
