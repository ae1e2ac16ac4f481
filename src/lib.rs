//! 계정 서비스 백엔드
//!
//! 인증, 역할 기반 인가, 요청 멱등성을 담당하는 Rust 서비스입니다.
//!
//! # Features
//!
//! - **인증**: bcrypt 비밀번호, 회전되는 리프레시 토큰, epoch 기반 전체 로그아웃
//! - **계정 복구**: 해시로 저장되는 일회용 토큰(이메일 인증, 비밀번호 재설정)
//! - **RBAC**: 역할/권한/할당, 만료되는 역할 할당, 라우트별 접근 요구사항
//! - **멱등성**: `Idempotency-Key` 헤더와 도메인 이벤트 소비자를 위한 인박스
//! - **저장소**: MongoDB + Redis 리포지토리 또는 프로세스 내 구현
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   HTTP Routes   │ ← REST API 엔드포인트
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │  Middlewares    │ ← 요청 ID, 기한, 멱등성, 인증/인가
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │    Handlers     │ ← 요청/응답 처리
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │    Services     │ ← 비즈니스 로직 (AppContext가 조립)
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │  Repositories   │ ← 저장소 트레이트와 구현
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ MongoDB + Redis │ ← 저장소
//! └─────────────────┘
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! use account_service_backend::core::context::{AppContext, Stores};
//! use account_service_backend::config::Environment;
//!
//! let ctx = AppContext::from_env(Stores::in_memory(), &Environment::current())?;
//! ctx.bootstrap(None).await?;
//!
//! let (user, tokens) = ctx.auth_service.register(request).await?;
//! ```

pub mod core;
pub mod config;
pub mod db;
pub mod caching;
pub mod domain;
pub mod repositories;
pub mod services;
pub mod utils;
pub mod routes;
pub mod handlers;
pub mod middlewares;

