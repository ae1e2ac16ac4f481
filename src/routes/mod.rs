//! API 라우트 설정 모듈
//!
//! 기능별 스코프를 등록합니다.
//!
//! | 스코프 | 인증 | 인가 | 멱등성 키 |
//! |--------|------|------|-----------|
//! | `/health`, `/.well-known/jwks.json` | - | - | - |
//! | `/api/v1/auth` | 리소스별 (`logout`, `profile` 등) | - | 리소스별 |
//! | `/api/v1/users` | 스코프 전체 | 리소스별 `Authorize` | 스코프 전체 (인증 안쪽) |
//! | `/api/v1/rbac` | 스코프 전체 | 리소스별 `Authorize` | 스코프 전체 (인증 안쪽) |
//!
//! 멱등성 키는 인증을 통과한 요청에서만 기록되므로 401 응답은 키를 소비하지 않습니다.
//!
//! JSON 본문 오류(형식, 크기, Content-Type)도 표준 에러 봉투로 응답합니다.
//!
//! # Examples
//!
//! ```rust,ignore
//! use actix_web::App;
//!
//! let app = App::new()
//!     .configure(|cfg| ctx.register(cfg))
//!     .configure(configure_all_routes);
//! ```

use actix_web::error::JsonPayloadError;
use actix_web::web;

use crate::config::ServerConfig;
use crate::core::errors::AppError;
use crate::handlers;
use crate::middlewares::{AuthMiddleware, Idempotency};

/// 모든 라우트를 설정합니다
pub fn configure_all_routes(cfg: &mut web::ServiceConfig) {
    configure_routes(cfg, ServerConfig::json_body_limit());
}

/// 본문 크기 제한을 지정해 라우트를 설정합니다
pub fn configure_routes(cfg: &mut web::ServiceConfig, json_limit: usize) {
    cfg.app_data(json_config(json_limit));

    cfg.service(handlers::health::health_check)
        .service(handlers::jwks::jwks);

    configure_auth_routes(cfg);
    configure_user_routes(cfg);
    configure_rbac_routes(cfg);
}

fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| json_error(err).into())
}

fn json_error(err: JsonPayloadError) -> AppError {
    match err {
        JsonPayloadError::ContentType => {
            AppError::UnsupportedMediaType("Content-Type은 application/json이어야 합니다".to_string())
        }
        JsonPayloadError::Overflow { limit } | JsonPayloadError::OverflowKnownLength { limit, .. } => {
            AppError::PayloadTooLarge(format!("요청 본문은 {} 바이트를 넘을 수 없습니다", limit))
        }
        JsonPayloadError::Deserialize(e) => AppError::ValidationError(format!("요청 본문을 해석할 수 없습니다: {}", e)),
        other => AppError::ValidationError(other.to_string()),
    }
}

/// 인증 라우트
///
/// 공개 라우트와 인증 라우트가 같은 스코프를 공유하므로 인증과 멱등성 키 검사는
/// 리소스 단위로 적용됩니다.
fn configure_auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/auth")
            // 공개
            .service(handlers::auth::register)
            .service(handlers::auth::login)
            .service(handlers::auth::refresh)
            .service(handlers::auth::verify_email)
            .service(handlers::auth::reset_password)
            .service(handlers::auth::confirm_reset)
            .service(handlers::auth::resend_verification)
            // Bearer 토큰 필요
            .service(handlers::auth::logout)
            .service(handlers::auth::logout_all)
            .service(handlers::auth::profile)
            .service(handlers::auth::permissions)
            .service(handlers::auth::change_password),
    );
}

fn configure_user_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/users")
            .wrap(Idempotency)
            .wrap(AuthMiddleware::required())
            .service(handlers::users::create_user)
            .service(handlers::users::get_user)
            .service(handlers::users::update_user)
            .service(handlers::users::delete_user)
            .service(handlers::users::update_user_status),
    );
}

fn configure_rbac_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/rbac")
            .wrap(Idempotency)
            .wrap(AuthMiddleware::required())
            // 역할
            .service(handlers::rbac::create_role)
            .service(handlers::rbac::list_roles)
            .service(handlers::rbac::get_role)
            .service(handlers::rbac::update_role)
            .service(handlers::rbac::delete_role)
            // 역할-권한 부여
            .service(handlers::rbac::role_permissions)
            .service(handlers::rbac::sync_role_permissions)
            .service(handlers::rbac::grant_permission)
            .service(handlers::rbac::revoke_permission)
            // 권한
            .service(handlers::rbac::create_permission)
            .service(handlers::rbac::list_permissions)
            .service(handlers::rbac::update_permission)
            .service(handlers::rbac::delete_permission)
            // 사용자-역할
            .service(handlers::rbac::user_roles)
            .service(handlers::rbac::assign_role)
            .service(handlers::rbac::unassign_role)
            .service(handlers::rbac::check_permissions)
            .service(handlers::rbac::cleanup_expired),
    );
}

#[cfg(test)]
mod tests;
