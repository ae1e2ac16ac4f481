//! # Configuration Module
//!
//! 백엔드 서비스의 설정 관리를 담당하는 모듈입니다.
//! Spring Framework의 `@Configuration` 클래스와 유사한 역할을 수행하며,
//! 환경 변수 기반의 설정값들을 중앙집중식으로 관리합니다.
//!
//! ## 모듈 구성
//!
//! - [`data_config`] - 실행 환경, 서버, 저장소, 패스워드 해싱 설정
//! - [`auth_config`] - JWT, 일회용 토큰, 멱등성 인박스, 이메일 설정
//!
//! ## 환경 분리
//!
//! `PROFILE` 값에 따라 `.env.dev` / `.env.prod` 파일이 먼저 로드되고,
//! 각 설정 함수는 환경 변수가 없을 때 개발용 기본값을 사용합니다.
//! 보안에 민감한 기본값(`JWT_SECRET` 등)을 사용하면 경고 로그를 남깁니다.
//!
//! ## 사용 예제
//!
//! ```rust,ignore
//! use crate::config::{Environment, ServerConfig, JwtConfig};
//!
//! let env = Environment::current();
//! let bind = format!("{}:{}", ServerConfig::host(), ServerConfig::port());
//! let access_ttl = JwtConfig::access_ttl();
//! ```

pub mod auth_config;
pub mod data_config;

pub use auth_config::*;
pub use data_config::*;
