//! 요청 처리 기한 미들웨어
//!
//! 기한 안에 응답이 만들어지지 않으면 핸들러 future를 드롭하고 408을 반환합니다.
//! 드롭된 future가 잡고 있던 연결과 잠금은 drop 시점에 해제됩니다.

use std::future::{ready, Ready};
use std::rc::Rc;
use std::time::Duration;

use actix_web::body::{BoxBody, EitherBody};
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{rt, Error};
use futures_util::future::LocalBoxFuture;

use crate::core::errors::AppError;

pub struct RequestTimeout {
    duration: Duration,
}

impl RequestTimeout {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestTimeout
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type Transform = RequestTimeoutService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestTimeoutService {
            service: Rc::new(service),
            duration: self.duration,
        }))
    }
}

pub struct RequestTimeoutService<S> {
    service: Rc<S>,
    duration: Duration,
}

impl<S, B> Service<ServiceRequest> for RequestTimeoutService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, actix_web::Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let duration = self.duration;
        let http_req = req.request().clone();

        Box::pin(async move {
            match rt::time::timeout(duration, service.call(req)).await {
                Ok(res) => Ok(res?.map_into_left_body()),
                Err(_) => {
                    log::warn!("요청 처리 기한 초과 ({:?}): {} {}", duration, http_req.method(), http_req.path());
                    Ok(ServiceResponse::from_err(AppError::RequestTimeout, http_req).map_into_right_body())
                }
            }
        })
    }
}
