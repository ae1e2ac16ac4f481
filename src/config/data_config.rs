//! 데이터 및 서버 설정 관리 모듈
//!
//! 데이터베이스, 서버, 환경 및 보안 관련 설정을 관리합니다.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// 환경 변수를 파싱하고, 없거나 형식이 잘못되면 기본값을 사용합니다.
pub(crate) fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("{} 파싱 실패: {:?}. 기본값 사용", key, raw);
            default
        }),
        Err(_) => default,
    }
}

/// 애플리케이션 실행 환경
#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    /// 개발 환경 - 빠른 개발을 위한 설정
    Development,
    /// 테스트 환경 - 자동화된 테스트용 설정
    Test,
    /// 스테이징 환경 - 프로덕션 유사 환경
    Staging,
    /// 프로덕션 환경 - 최고 수준의 보안 및 성능
    Production,
}

impl Environment {
    /// 현재 실행 환경을 감지합니다.
    ///
    /// `ENVIRONMENT` 환경 변수를 확인하며,
    /// 설정되지 않은 경우 `Production`을 기본값으로 사용합니다.
    pub fn current() -> Self {
        Self::from_str(&env::var("ENVIRONMENT").unwrap_or_else(|_| "production".to_string()))
    }

    /// 문자열에서 Environment를 생성합니다.
    ///
    /// 알 수 없는 값인 경우 `Production`을 반환합니다.
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            "test" | "testing" => Environment::Test,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Production,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

/// 패스워드 해싱 설정
pub struct PasswordConfig;

impl PasswordConfig {
    /// 현재 환경에 맞는 bcrypt cost를 반환합니다.
    ///
    /// `BCRYPT_COST`가 4-15 범위면 그 값을 사용합니다.
    ///
    /// # Environment Defaults
    ///
    /// - Development/Test: 4 (빠른 처리)
    /// - Staging: 10 (중간 보안)
    /// - Production: 12 (고보안)
    pub fn bcrypt_cost() -> u32 {
        if let Ok(cost_str) = env::var("BCRYPT_COST") {
            if let Ok(cost) = cost_str.parse::<u32>() {
                if (4..=15).contains(&cost) {
                    return cost;
                }
            }
        }

        Self::bcrypt_cost_for_env(&Environment::current())
    }

    /// 특정 환경에 대한 bcrypt cost를 반환합니다.
    pub fn bcrypt_cost_for_env(env: &Environment) -> u32 {
        match env {
            Environment::Development => 4,
            Environment::Test => 4,
            Environment::Staging => 10,
            Environment::Production => 12,
        }
    }
}

/// 서버 바인딩 및 요청 처리 설정
pub struct ServerConfig;

impl ServerConfig {
    /// 서버 포트. 기본값: 8080 (`PORT`)
    pub fn port() -> u16 {
        env_or("PORT", 8080)
    }

    /// 바인딩 호스트. 기본값: "0.0.0.0" (`HOST`)
    pub fn host() -> String {
        env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string())
    }

    /// 워커 스레드 수. 기본값: 4 (`SERVER_WORKERS`)
    pub fn workers() -> usize {
        env_or("SERVER_WORKERS", 4)
    }

    /// 요청 처리 기한. 기본값: 30초 (`REQUEST_TIMEOUT_SECS`)
    ///
    /// 기한을 넘기면 핸들러 future가 드롭되어 진행 중인 I/O가 취소되고 408이 반환됩니다.
    pub fn request_timeout() -> Duration {
        Duration::from_secs(env_or("REQUEST_TIMEOUT_SECS", 30u64).max(1))
    }

    /// JSON 본문 최대 크기(바이트). 기본값: 64KiB (`JSON_BODY_LIMIT`)
    pub fn json_body_limit() -> usize {
        env_or("JSON_BODY_LIMIT", 64 * 1024)
    }

    /// CORS 허용 Origin 목록 (`CORS_ALLOWED_ORIGINS`, 쉼표 구분)
    pub fn cors_allowed_origins() -> Vec<String> {
        env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// 저장소 백엔드 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// MongoDB + Redis
    Mongo,
    /// 프로세스 내 메모리 (로컬 실행 및 테스트)
    Memory,
}

impl StorageBackend {
    /// `STORAGE_BACKEND` 환경 변수에서 읽습니다. 기본값: `Mongo`
    pub fn current() -> Self {
        match env::var("STORAGE_BACKEND").unwrap_or_default().trim().to_lowercase().as_str() {
            "memory" | "in-memory" | "inmemory" => StorageBackend::Memory,
            _ => StorageBackend::Mongo,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Mongo => "mongodb",
            StorageBackend::Memory => "memory",
        }
    }
}

/// MongoDB 연결 풀 설정
pub struct DatabaseConfig;

impl DatabaseConfig {
    pub fn uri() -> String {
        env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string())
    }

    /// 읽기 전용 조회에 사용할 복제본 URI (선택)
    pub fn replica_uri() -> Option<String> {
        env::var("MONGODB_REPLICA_URI").ok().filter(|uri| !uri.trim().is_empty())
    }

    pub fn database_name() -> String {
        env::var("DATABASE_NAME").unwrap_or_else(|_| "account_service".to_string())
    }

    pub fn max_pool_size() -> u32 {
        env_or("DB_MAX_POOL_SIZE", 20)
    }

    pub fn min_pool_size() -> u32 {
        env_or("DB_MIN_POOL_SIZE", 2)
    }

    pub fn max_idle_time() -> Duration {
        Duration::from_secs(env_or("DB_MAX_IDLE_SECS", 300))
    }

    pub fn connect_timeout() -> Duration {
        Duration::from_secs(env_or("DB_CONNECT_TIMEOUT_SECS", 10))
    }
}
