//! # Core Framework Module
//!
//! 서비스 전반에서 공유하는 프레임워크 기능입니다.
//!
//! ## 모듈 구성
//!
//! ### [`registry`] - 리포지토리 싱글톤 컨테이너
//! - **ServiceLocator**: 타입별 인스턴스 보관과 조회
//! - **자동 레지스트리**: `inventory` 기반 `#[repository]` 등록 정보 수집
//! - **인프라 등록**: `Database`, `RedisClient`를 기동 시 `set()`으로 등록
//!
//! ### [`errors`] - 통합 에러 처리
//! - **AppError**: 애플리케이션 전역 에러 타입
//! - **HTTP 통합**: `ResponseError` 구현으로 표준 응답 봉투 변환
//! - **AuthFailure**: 로그에만 남는 인증 실패 사유
//!
//! ### [`context`] - 서비스 조립
//! - **Stores**: 저장소 트레이트 구현 묶음 (MongoDB/Redis 또는 프로세스 내)
//! - **AppContext**: 서비스 그래프 생성과 `web::Data` 등록
//!
//! ## 애플리케이션 초기화
//!
//! ```rust,ignore
//! ServiceLocator::set(Arc::new(Database::new().await?));
//! ServiceLocator::set(Arc::new(RedisClient::from_env().await?));
//! ServiceLocator::initialize_all();
//!
//! let ctx = AppContext::from_env(Stores::persistent(), &Environment::current())?;
//! HttpServer::new(move || {
//!     App::new()
//!         .configure(|cfg| ctx.register(cfg))
//!         .configure(configure_all_routes)
//! })
//! ```
//!
//! ## 트러블슈팅
//!
//! ### 미등록 타입 에러
//! ```text
//! panic: Service not found: Database. Register it with ServiceLocator::set() or #[repository]
//! ```
//! **해결**: `Stores::persistent()` 호출 전에 인프라 인스턴스를 `ServiceLocator::set()`으로 등록

pub mod context;
pub mod errors;
pub mod registry;

pub use errors::*;
pub use registry::*;
