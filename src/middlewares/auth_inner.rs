//! AuthMiddleware 인증 로직의 핵심적인 기능
use std::rc::Rc;

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse};
use actix_web::http::header;
use actix_web::{web, Error, HttpMessage};
use futures_util::future::LocalBoxFuture;

use crate::core::errors::{AppError, AuthFailure};
use crate::domain::models::auth::AuthenticatedUser;
use crate::domain::models::token::TokenKind;
use crate::services::auth::TokenService;

/// 실제 인증 로직을 수행하는 서비스
pub struct AuthMiddlewareService<S> {
    pub service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, actix_web::Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            match authenticate(&req).await {
                Ok(user) => {
                    log::debug!("인증 성공: 사용자 ID {}", user.user_id);
                    req.extensions_mut().insert(user);
                }
                Err(err) => {
                    match err.auth_failure() {
                        Some(reason) => log::warn!("인증 실패: {} {} ({})", req.method(), req.path(), reason),
                        None => log::error!("인증 처리 오류: {}", err),
                    }
                    return Ok(req.error_response(err).map_into_right_body());
                }
            }

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

/// Authorization 헤더의 access 토큰을 전체 검증합니다.
async fn authenticate(req: &ServiceRequest) -> Result<AuthenticatedUser, AppError> {
    let token_service = req
        .app_data::<web::Data<TokenService>>()
        .cloned()
        .ok_or_else(|| AppError::InternalError("TokenService가 등록되지 않았습니다".to_string()))?;

    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::AuthenticationError(AuthFailure::MissingToken))?;

    let token = TokenService::extract_bearer_token(auth_header)?;
    let (claims, user) = token_service.validate(token, TokenKind::Access).await?;

    Ok(AuthenticatedUser {
        token_expires_at: claims.expires_at(),
        user_id: user.id,
        email: user.email,
        jti: claims.jti,
    })
}
