use actix_web::{get, web, HttpResponse};

use crate::core::errors::AppError;
use crate::services::auth::TokenService;

/// RS256 공개키 JWKS. HS256 설정에서는 공개할 키가 없어 404입니다.
#[get("/.well-known/jwks.json")]
pub async fn jwks(tokens: web::Data<TokenService>) -> Result<HttpResponse, AppError> {
    match tokens.signing_keys().jwks() {
        Some(key_set) => Ok(HttpResponse::Ok()
            .insert_header(("Cache-Control", "public, max-age=3600"))
            .json(key_set)),
        None => Err(AppError::NotFound("공개된 서명 키가 없습니다".to_string())),
    }
}
