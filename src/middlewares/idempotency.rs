//! HTTP 멱등성 미들웨어
//!
//! 쓰기 메서드(POST/PUT/PATCH/DELETE)에 `Idempotency-Key` 헤더가 있으면
//! `(key, method, path, query)`로 인박스에 먼저 기록합니다. 이미 기록이 있으면
//! 핸들러를 실행하지 않고 `409 Conflict`로 거부합니다. 원래 응답을 재생하지는 않습니다.

use std::future::{ready, Ready};
use std::rc::Rc;

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::Method;
use actix_web::{web, Error};
use futures_util::future::LocalBoxFuture;

use crate::core::errors::AppError;
use crate::services::inbox::{InboxService, HTTP_CONSUMER_ID};

pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

const MAX_KEY_LENGTH: usize = 255;

fn is_write(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH | Method::DELETE)
}

pub struct Idempotency;

impl<S, B> Transform<S, ServiceRequest> for Idempotency
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = IdempotencyService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IdempotencyService {
            service: Rc::new(service),
        }))
    }
}

pub struct IdempotencyService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for IdempotencyService<S>
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
            if let Err(err) = claim_key(&req).await {
                return Ok(req.error_response(err).map_into_right_body());
            }

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

/// 키가 없거나 읽기 요청이면 그대로 통과합니다.
async fn claim_key(req: &ServiceRequest) -> Result<(), AppError> {
    if !is_write(req.method()) {
        return Ok(());
    }

    let key = match req.headers().get(IDEMPOTENCY_KEY_HEADER).map(|value| value.to_str()) {
        None => return Ok(()),
        Some(Ok(key)) if !key.trim().is_empty() => key.trim(),
        Some(_) => {
            return Err(AppError::ValidationError("Idempotency-Key 헤더 형식이 올바르지 않습니다".to_string()));
        }
    };
    if key.len() > MAX_KEY_LENGTH {
        return Err(AppError::ValidationError(format!(
            "Idempotency-Key는 {}자를 넘을 수 없습니다",
            MAX_KEY_LENGTH
        )));
    }

    let inbox = req
        .app_data::<web::Data<InboxService>>()
        .cloned()
        .ok_or_else(|| AppError::InternalError("InboxService가 등록되지 않았습니다".to_string()))?;

    let method = req.method().as_str();
    let path = req.path();
    let message_id = InboxService::http_message_id(key, method, path, req.query_string());
    let event_type = InboxService::http_event_type(method, path);

    if inbox
        .process_if_new(&message_id, HTTP_CONSUMER_ID, &event_type, inbox.default_ttl())
        .await?
    {
        Ok(())
    } else {
        log::info!("중복 요청 거부: {} {} (message_id={})", method, path, message_id);
        Err(AppError::DuplicateRequest)
    }
}
