//! 계정 서비스 메인 애플리케이션
//!
//! 저장소 백엔드를 준비하고 서비스 그래프를 조립한 뒤 Actix-web HTTP 서버를 구동합니다.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use account_service_backend::caching::redis::RedisClient;
use account_service_backend::config::{BootstrapConfig, Environment, IdempotencyConfig, ServerConfig, StorageBackend};
use account_service_backend::core::context::{AppContext, Stores};
use account_service_backend::core::errors::AppError;
use account_service_backend::core::registry::ServiceLocator;
use account_service_backend::db::Database;
use account_service_backend::middlewares::{RequestIdMiddleware, RequestTimeout, REQUEST_ID_HEADER};
use account_service_backend::routes::configure_all_routes;
use actix_cors::Cors;
use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::http::header;
use actix_web::{middleware, App, HttpServer};
use dotenv::dotenv;
use env_logger::Env;
use log::{error, info};

/// Rate Limiting 설정 구조체
#[derive(Debug)]
struct RateLimitConfig {
    per_second: u64,
    burst_size: u32,
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // 환경 설정 및 로깅 초기화
    load_env_file();
    init_logging();

    let environment = Environment::current();
    info!("🚀 계정 서비스 시작중... (environment: {})", environment.as_str());

    let stores = initialize_stores().await.map_err(startup_error)?;

    let ctx = AppContext::from_env(stores, &environment).map_err(startup_error)?;
    ctx.bootstrap(BootstrapConfig::admin_email().as_deref())
        .await
        .map_err(startup_error)?;
    info!("✅ 기본 역할/권한 시드 완료");

    let sweep_every = Duration::from_secs(IdempotencyConfig::sweep_interval_secs());
    let _sweeper = ctx.sweeper.clone().spawn(sweep_every);

    start_http_server(ctx).await
}

fn startup_error(e: AppError) -> io::Error {
    error!("기동 실패: {}", e);
    io::Error::other(e.to_string())
}

/// 저장소 백엔드를 준비합니다
///
/// * `STORAGE_BACKEND=mongo` (기본값) - MongoDB/Redis 연결, 리포지토리 초기화, 인덱스 생성
/// * `STORAGE_BACKEND=memory` - 프로세스 내 저장소 (재시작 시 데이터 소실)
async fn initialize_stores() -> Result<Stores, AppError> {
    match StorageBackend::current() {
        StorageBackend::Mongo => {
            info!("📡 데이터베이스 연결 중...");
            let database = Arc::new(Database::new().await?);
            info!("✅ MongoDB 연결 성공");

            let redis_client = Arc::new(RedisClient::from_env().await?);
            info!("✅ Redis 연결 성공");

            // ServiceLocator에 핵심 인프라 등록
            ServiceLocator::set(database);
            ServiceLocator::set(redis_client);
            let count = ServiceLocator::initialize_all();
            info!("✅ 리포지토리 {}개 초기화 완료", count);

            let stores = Stores::persistent();
            stores.create_indexes().await?;
            info!("✅ 인덱스 생성 완료");
            Ok(stores)
        }
        StorageBackend::Memory => {
            log::warn!("⚠️ 프로세스 내 저장소를 사용합니다. 재시작하면 데이터가 사라집니다");
            Ok(Stores::in_memory())
        }
    }
}

/// HTTP 서버를 구성하고 실행합니다
///
/// 미들웨어는 바깥쪽부터 경로 정규화, 접근 로그, CORS, 요청 ID, 처리 기한,
/// Rate Limiting 순서로 적용됩니다. `Governor`는 서비스 future에 `Unpin`을 요구하므로
/// 라우트 바로 바깥에 둡니다. 멱등성 키 검사는 라우트 스코프에서 인증 안쪽에 적용됩니다.
///
/// # Errors
///
/// * `std::io::Error` - 포트 바인딩 실패 또는 서버 실행 오류
async fn start_http_server(ctx: AppContext) -> io::Result<()> {
    let bind_address = format!("{}:{}", ServerConfig::host(), ServerConfig::port());
    let workers = ServerConfig::workers();
    let request_timeout = ServerConfig::request_timeout();

    info!("🌐 서버가 http://{} 에서 실행중입니다 (workers: {})", bind_address, workers);
    info!("📍 Health check: http://{}/health", bind_address);

    // Rate Limiting 설정
    let rate_limit_config = load_rate_limit_config();
    let governor_conf = GovernorConfigBuilder::default()
        .requests_per_second(rate_limit_config.per_second)
        .burst_size(rate_limit_config.burst_size)
        .use_headers()
        .finish()
        .ok_or_else(|| io::Error::other("Rate Limiting 설정이 올바르지 않습니다"))?;

    info!(
        "🛡️ Rate Limiting 활성화: 초당 {}요청, 버스트 {}개",
        rate_limit_config.per_second,
        rate_limit_config.burst_size
    );

    let allowed_origins = ServerConfig::cors_allowed_origins();

    HttpServer::new(move || {
        let ctx = ctx.clone();

        App::new()
            .configure(|cfg| ctx.register(cfg))
            .configure(configure_all_routes)
            .wrap(Governor::new(&governor_conf))
            .wrap(RequestTimeout::new(request_timeout))
            .wrap(RequestIdMiddleware)
            .wrap(configure_cors(&allowed_origins))
            .wrap(middleware::Logger::new(r#"%a "%r" %s %b %Dms req=%{x-request-id}o"#))
            .wrap(middleware::NormalizePath::trim())
    })
    .bind(bind_address)?
    .workers(workers)
    .run()
    .await
}

/// 환경별 설정 파일을 로드합니다
///
/// * `PROFILE=dev` - .env.dev 파일 로드 (기본값)
/// * `PROFILE=prod` - .env.prod 파일 로드
/// * 기타 - 기본 .env 파일 로드
fn load_env_file() {
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "dev".to_string());

    // 로거 초기화 전이므로 결과는 표준 에러로 남깁니다
    let result = match profile.as_str() {
        "prod" => dotenv::from_filename(".env.prod").map(|_| ".env.prod"),
        "dev" => dotenv::from_filename(".env.dev").map(|_| ".env.dev"),
        _ => dotenv().map(|_| ".env"),
    };

    match result {
        Ok(file) => eprintln!("profile={}, {} 파일 로드 됨", profile, file),
        Err(e) => eprintln!("profile={}, 설정 파일 로드 실패: {}", profile, e),
    }
}

/// 로깅 시스템을 초기화합니다
///
/// * `RUST_LOG` - 로깅 레벨 설정 (기본값: "info,actix_web=info")
///
/// ```bash
/// RUST_LOG=account_service_backend::middlewares=debug cargo run
/// ```
fn init_logging() {
    env_logger::init_from_env(Env::default().default_filter_or("info,actix_web=info"));
}

/// CORS 설정을 구성합니다
///
/// 허용 Origin은 `CORS_ALLOWED_ORIGINS`(쉼표 구분)에서 읽습니다.
fn configure_cors(allowed_origins: &[String]) -> Cors {
    let cors = allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin));

    cors.allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "PATCH", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::HeaderName::from_static("idempotency-key"),
            header::HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers(vec![header::HeaderName::from_static(REQUEST_ID_HEADER)])
        .supports_credentials()
        .max_age(3600)
}

/// 환경변수에서 Rate Limiting 설정을 로드합니다
///
/// * `RATE_LIMIT_PER_SECOND` - 초당 허용 요청 수 (기본값: 100)
/// * `RATE_LIMIT_BURST_SIZE` - 버스트 허용량 (기본값: 200)
fn load_rate_limit_config() -> RateLimitConfig {
    let per_second = std::env::var("RATE_LIMIT_PER_SECOND")
        .unwrap_or_else(|_| "100".to_string())
        .parse::<u64>()
        .unwrap_or_else(|e| {
            error!("RATE_LIMIT_PER_SECOND 파싱 실패: {}. 기본값 100 사용", e);
            100
        });

    let burst_size = std::env::var("RATE_LIMIT_BURST_SIZE")
        .unwrap_or_else(|_| "200".to_string())
        .parse::<u32>()
        .unwrap_or_else(|e| {
            error!("RATE_LIMIT_BURST_SIZE 파싱 실패: {}. 기본값 200 사용", e);
            200
        });

    let config = RateLimitConfig {
        per_second,
        burst_size,
    };

    info!("Rate Limiting 설정 로드됨: {:?}", config);
    config
}
