//! 인가 미들웨어
//!
//! 인증 미들웨어 안쪽에서 [`AccessRequirement`]를 평가합니다.
//! 경로 파라미터가 필요한 요구사항(`Ownership`)이 있으므로 리소스 단위로 감쌉니다.
//!
//! ```rust,ignore
//! #[get("/{user_id}", wrap = "Authorize::ownership(\"user_id\")")]
//! pub async fn get_user(...) -> Result<HttpResponse, AppError> { ... }
//! ```

use std::future::{ready, Ready};
use std::rc::Rc;

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web, Error, HttpMessage};
use futures_util::future::LocalBoxFuture;

use crate::core::errors::{AppError, AuthFailure};
use crate::domain::models::auth::access_requirement::{action_for_method, resource_from_path};
use crate::domain::models::auth::{AccessRequirement, AuthenticatedUser};
use crate::services::rbac::AuthorizationService;

/// 접근 요구사항 미들웨어
pub struct Authorize {
    requirement: Rc<AccessRequirement>,
}

impl Authorize {
    pub fn new(requirement: AccessRequirement) -> Self {
        Self {
            requirement: Rc::new(requirement),
        }
    }

    pub fn permission(resource: &str, action: &str) -> Self {
        Self::new(AccessRequirement::Permission {
            resource: resource.to_string(),
            action: action.to_string(),
        })
    }

    pub fn role(role: &str) -> Self {
        Self::new(AccessRequirement::Role(role.to_string()))
    }

    pub fn any_role(roles: &[&str]) -> Self {
        Self::new(AccessRequirement::AnyRole(roles.iter().map(|r| r.to_string()).collect()))
    }

    pub fn ownership(param: &str) -> Self {
        Self::new(AccessRequirement::Ownership {
            param: param.to_string(),
        })
    }

    pub fn dynamic() -> Self {
        Self::new(AccessRequirement::Dynamic)
    }
}

impl<S, B> Transform<S, ServiceRequest> for Authorize
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthorizeService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthorizeService {
            service: Rc::new(service),
            requirement: self.requirement.clone(),
        }))
    }
}

pub struct AuthorizeService<S> {
    service: Rc<S>,
    requirement: Rc<AccessRequirement>,
}

impl<S, B> Service<ServiceRequest> for AuthorizeService<S>
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
        let requirement = self.requirement.clone();

        Box::pin(async move {
            if let Err(err) = evaluate(&req, &requirement).await {
                return Ok(req.error_response(err).map_into_right_body());
            }

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

async fn evaluate(req: &ServiceRequest, requirement: &AccessRequirement) -> Result<(), AppError> {
    let user = req
        .extensions()
        .get::<AuthenticatedUser>()
        .cloned()
        .ok_or(AppError::AuthenticationError(AuthFailure::MissingToken))?;

    let authz = req
        .app_data::<web::Data<AuthorizationService>>()
        .cloned()
        .ok_or_else(|| AppError::InternalError("AuthorizationService가 등록되지 않았습니다".to_string()))?;

    let allowed = match requirement {
        AccessRequirement::Permission { resource, action } => {
            authz.has_permission(&user.user_id, resource, action).await?
        }
        AccessRequirement::Role(role) => authz.has_role(&user.user_id, role).await?,
        AccessRequirement::AnyRole(roles) => authz.has_any_role(&user.user_id, roles.as_slice()).await?,
        AccessRequirement::Ownership { param } => match req.match_info().get(param) {
            Some(owner) if owner == user.user_id => true,
            _ => authz.is_admin(&user.user_id).await?,
        },
        AccessRequirement::Dynamic => {
            match (resource_from_path(req.path()), action_for_method(req.method())) {
                (Some(resource), Some(action)) => authz.has_permission(&user.user_id, &resource, action).await?,
                _ => false,
            }
        }
    };

    if allowed {
        Ok(())
    } else {
        log::warn!(
            "권한 부족: user={}, required={}, {} {}",
            user.user_id,
            requirement.describe(),
            req.method(),
            req.path()
        );
        Err(AppError::AuthorizationError("접근 권한이 부족합니다".to_string()))
    }
}
