use actix_web::{get, web, HttpResponse};
use serde_json::json;

use crate::core::context::AppContext;

/// 서비스 상태 확인
///
/// ```json
/// {
///   "status": "healthy",
///   "service": "account_service_backend",
///   "version": "0.1.0",
///   "storage": "mongodb",
///   "timestamp": "2026-01-01T00:00:00Z"
/// }
/// ```
#[get("/health")]
pub async fn health_check(ctx: web::Data<AppContext>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "storage": ctx.storage_backend.as_str(),
        "timestamp": ctx.clock.now().to_rfc3339(),
    }))
}
