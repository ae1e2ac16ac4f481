//! 인증 및 보안 서비스 모듈
//!
//! - [`signing_keys`] - HS256/RS256 서명 키와 JWKS
//! - [`token_service`] - access/refresh 토큰 발급, 검증, 회전, 폐기
//! - [`password_service`] - bcrypt 해싱과 더미 해시 비교
//! - [`verification_service`] - 이메일 인증/비밀번호 재설정 일회용 토큰
//! - [`auth_service`] - 위 서비스들을 묶은 계정 인증 흐름
//!
//! # Examples
//!
//! ```rust,ignore
//! let (user, pair) = ctx.auth_service.login(request).await?;
//! let (claims, user) = ctx.token_service.validate(&pair.access_token, TokenKind::Access).await?;
//! ```

pub mod auth_service;
pub mod password_service;
pub mod signing_keys;
pub mod token_service;
pub mod verification_service;

pub use auth_service::AuthService;
pub use password_service::PasswordService;
pub use signing_keys::SigningKeys;
pub use token_service::{TokenService, TokenSettings};
pub use verification_service::{VerificationService, VerificationSettings};
