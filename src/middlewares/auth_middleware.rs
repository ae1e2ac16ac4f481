//! JWT 인증 미들웨어
//!
//! ActixWeb 요청 파이프라인에서 access 토큰을 검증하고 [`AuthenticatedUser`]를
//! 요청 extensions에 넣습니다. 실제 검증은 `auth_inner`의 서비스가 수행합니다.
//!
//! [`AuthenticatedUser`]: crate::domain::models::auth::AuthenticatedUser

use std::future::{ready, Ready};
use std::rc::Rc;

use actix_web::{
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    Error, Result,
};

use crate::middlewares::auth_inner::AuthMiddlewareService;

/// JWT 인증 미들웨어
///
/// ```rust,ignore
/// web::scope("/api/v1/auth")
///     .wrap(AuthMiddleware::required())
///     .service(handlers::auth::logout)
/// ```
pub struct AuthMiddleware;

impl AuthMiddleware {
    /// 토큰이 없거나 유효하지 않으면 401
    pub fn required() -> Self {
        Self
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}
