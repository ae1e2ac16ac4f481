//! Authentication HTTP Handlers
//!
//! 회원가입, 로그인, 토큰 갱신과 계정 복구 엔드포인트입니다.
//!
//! # Endpoints
//!
//! | 메서드 | 경로 | 인증 | 성공 |
//! |--------|------|------|------|
//! | `POST` | `/auth/register` | - | 201 `{user, tokens}` |
//! | `POST` | `/auth/login` | - | 200 `{user, tokens}` |
//! | `POST` | `/auth/refresh` | - | 200 `{tokens}` |
//! | `POST` | `/auth/verify-email` | - | 200 |
//! | `POST` | `/auth/reset-password` | - | 200 (항상) |
//! | `POST` | `/auth/confirm-reset` | - | 200 |
//! | `POST` | `/auth/resend-verification` | - | 200 (항상) |
//! | `POST` | `/auth/logout` | Bearer | 200 |
//! | `POST` | `/auth/logout-all` | Bearer | 200 |
//! | `GET` | `/auth/profile` | Bearer | 200 `{user, roles, permissions}` |
//! | `GET` | `/auth/permissions` | Bearer | 200 `[permission]` |
//! | `PUT` | `/auth/change-password` | Bearer | 200 `{tokens}` |
//!
//! 재설정 요청과 인증 메일 재발송은 계정 존재 여부와 관계없이 같은 응답을 반환합니다.

use actix_web::{get, post, put, web, HttpResponse};
use validator::Validate;

use crate::core::errors::AppError;
use crate::domain::dto::api_response::ApiResponse;
use crate::domain::dto::auth::{
    AuthResponse, ChangePasswordRequest, ConfirmResetRequest, EmailRequest, LoginRequest, LogoutRequest,
    PermissionInfo, ProfileResponse, RefreshResponse, RefreshTokenRequest, RegisterRequest, TokenResponse,
    VerifyEmailRequest,
};
use crate::domain::dto::users::response::UserResponse;
use crate::domain::models::auth::AuthenticatedUser;
use crate::middlewares::{AuthMiddleware, Idempotency};
use crate::services::auth::AuthService;
use crate::services::rbac::AuthorizationService;

/// 재설정/재발송 요청에 공통으로 쓰는 응답 문구
const ACCOUNT_MAIL_ACCEPTED: &str = "해당 이메일로 가입된 계정이 있으면 안내 메일이 발송됩니다";

/// 회원가입
///
/// 기본 `USER` 역할을 부여하고 인증 메일을 보낸 뒤 토큰 쌍을 바로 발급합니다.
#[post("/register", wrap = "Idempotency")]
pub async fn register(
    auth: web::Data<AuthService>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let (user, tokens) = auth.register(payload.into_inner()).await?;

    let body = AuthResponse {
        user: UserResponse::from(user),
        tokens: TokenResponse::from(tokens),
    };
    Ok(HttpResponse::Created().json(ApiResponse::with_message(body, "회원가입이 완료되었습니다")))
}

/// 이메일/비밀번호 로그인
///
/// 계정 없음, 비밀번호 불일치, 비활성 계정 모두 같은 401 응답입니다.
#[post("/login", wrap = "Idempotency")]
pub async fn login(
    auth: web::Data<AuthService>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let (user, tokens) = auth.login(payload.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(AuthResponse {
        user: UserResponse::from(user),
        tokens: TokenResponse::from(tokens),
    })))
}

/// 리프레시 토큰 회전
#[post("/refresh", wrap = "Idempotency")]
pub async fn refresh(
    auth: web::Data<AuthService>,
    payload: web::Json<RefreshTokenRequest>,
) -> Result<HttpResponse, AppError> {
    payload.validate()?;
    let tokens = auth.refresh(&payload.refresh_token).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(RefreshResponse {
        tokens: TokenResponse::from(tokens),
    })))
}

#[post("/verify-email", wrap = "Idempotency")]
pub async fn verify_email(
    auth: web::Data<AuthService>,
    payload: web::Json<VerifyEmailRequest>,
) -> Result<HttpResponse, AppError> {
    let user = auth.verify_email(payload.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        UserResponse::from(user),
        "이메일 인증이 완료되었습니다",
    )))
}

#[post("/reset-password", wrap = "Idempotency")]
pub async fn reset_password(
    auth: web::Data<AuthService>,
    payload: web::Json<EmailRequest>,
) -> Result<HttpResponse, AppError> {
    auth.request_password_reset(&payload.email).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message_only(ACCOUNT_MAIL_ACCEPTED)))
}

#[post("/confirm-reset", wrap = "Idempotency")]
pub async fn confirm_reset(
    auth: web::Data<AuthService>,
    payload: web::Json<ConfirmResetRequest>,
) -> Result<HttpResponse, AppError> {
    auth.confirm_password_reset(payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message_only("비밀번호가 재설정되었습니다. 다시 로그인해주세요")))
}

#[post("/resend-verification", wrap = "Idempotency")]
pub async fn resend_verification(
    auth: web::Data<AuthService>,
    payload: web::Json<EmailRequest>,
) -> Result<HttpResponse, AppError> {
    auth.resend_verification(&payload.email).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message_only(ACCOUNT_MAIL_ACCEPTED)))
}

/// 현재 access 토큰과 (본문에 있으면) 리프레시 토큰을 폐기합니다.
///
/// 본문은 생략할 수 있습니다.
#[post("/logout", wrap = "Idempotency", wrap = "AuthMiddleware::required()")]
pub async fn logout(
    auth: web::Data<AuthService>,
    user: AuthenticatedUser,
    payload: Option<web::Json<LogoutRequest>>,
) -> Result<HttpResponse, AppError> {
    let request = payload.map(|p| p.into_inner()).unwrap_or_default();
    auth.logout(&user, request.refresh_token.as_deref()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::message_only("로그아웃되었습니다")))
}

/// 모든 기기에서 로그아웃 (토큰 epoch 증가)
#[post("/logout-all", wrap = "Idempotency", wrap = "AuthMiddleware::required()")]
pub async fn logout_all(
    auth: web::Data<AuthService>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    auth.logout_all(&user).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message_only("모든 세션이 로그아웃되었습니다")))
}

#[get("/profile", wrap = "AuthMiddleware::required()")]
pub async fn profile(
    auth: web::Data<AuthService>,
    authz: web::Data<AuthorizationService>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let account = auth.current_user(&user.user_id).await?;
    let roles = authz
        .effective_roles(&user.user_id)
        .await?
        .into_iter()
        .map(|role| role.name)
        .collect();
    let permission_names = authz
        .effective_permissions(&user.user_id)
        .await?
        .into_iter()
        .map(|permission| permission.name)
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::success(ProfileResponse {
        user: UserResponse::from(account),
        roles,
        permissions: permission_names,
    })))
}

#[get("/permissions", wrap = "AuthMiddleware::required()")]
pub async fn permissions(
    authz: web::Data<AuthorizationService>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let granted: Vec<PermissionInfo> = authz
        .effective_permissions(&user.user_id)
        .await?
        .into_iter()
        .map(PermissionInfo::from)
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::success(granted)))
}

/// 비밀번호 변경
///
/// 기존 토큰은 모두 무효화되고, 이 요청에 대한 새 토큰 쌍이 반환됩니다.
#[put("/change-password", wrap = "Idempotency", wrap = "AuthMiddleware::required()")]
pub async fn change_password(
    auth: web::Data<AuthService>,
    user: AuthenticatedUser,
    payload: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse, AppError> {
    let tokens = auth.change_password(&user.user_id, payload.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        RefreshResponse {
            tokens: TokenResponse::from(tokens),
        },
        "비밀번호가 변경되었습니다",
    )))
}
