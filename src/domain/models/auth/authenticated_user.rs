use std::future::{ready, Ready};

use actix_web::{FromRequest, HttpMessage, HttpRequest};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::errors::{AppError, AuthFailure};

/// 검증된 access 토큰에서 추출된 사용자 정보
///
/// 인증 미들웨어가 요청 extensions에 넣고, 핸들러는 추출자로 꺼냅니다.
/// 역할은 담지 않습니다. 권한 검사는 항상 저장소 기준으로 수행됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// 사용자 고유 ID
    pub user_id: String,

    pub email: String,

    /// 현재 access 토큰의 jti (로그아웃 시 폐기 대상)
    pub jti: String,

    /// 현재 access 토큰의 만료 시각
    pub token_expires_at: DateTime<Utc>,
}

/// ActixWeb FromRequest trait 구현
impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => ready(Err(AppError::AuthenticationError(AuthFailure::MissingToken))),
        }
    }
}
