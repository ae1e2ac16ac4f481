//! # User Management HTTP Handlers
//!
//! 사용자 관리 엔드포인트입니다. 모든 라우트는 인증 스코프 안에 등록됩니다.
//!
//! | 메서드 | 경로 | 접근 조건 | 상태 코드 |
//! |--------|------|-----------|-----------|
//! | `POST` | `/users` | `users:create` (경로/메서드에서 유도) | 201 Created |
//! | `GET` | `/users/{user_id}` | 본인 또는 관리자 | 200 OK |
//! | `PUT` | `/users/{user_id}` | 본인 또는 관리자 | 200 OK, 409 (버전 불일치) |
//! | `DELETE` | `/users/{user_id}` | 본인 또는 관리자 | 200 OK |
//! | `PATCH` | `/users/{user_id}/status` | `ADMIN` 역할 | 200 OK |
//!
//! ## 낙관적 잠금
//!
//! `PUT` 요청 본문에는 마지막으로 읽은 `version`이 필요합니다.
//!
//! ```json
//! { "name": "Robert", "version": 3 }
//! ```

use actix_web::{delete, get, patch, post, put, web, HttpResponse};

use crate::core::errors::AppError;
use crate::domain::dto::api_response::ApiResponse;
use crate::domain::dto::users::request::{CreateUserRequest, UpdateUserRequest, UpdateUserStatusRequest};
use crate::domain::dto::users::response::UserResponse;
use crate::middlewares::Authorize;
use crate::services::users::UserService;

/// 관리자 사용자 생성
///
/// # 요청 본문
///
/// ```json
/// {
///   "email": "bob@example.com",
///   "name": "Bob",
///   "password": "Passw0rd!",
///   "is_verified": true
/// }
/// ```
#[post("", wrap = "Authorize::dynamic()")]
pub async fn create_user(
    users: web::Data<UserService>,
    payload: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let user = users.create_user(payload.into_inner()).await?;

    Ok(HttpResponse::Created().json(ApiResponse::with_message(
        UserResponse::from(user),
        "사용자가 생성되었습니다",
    )))
}

#[get("/{user_id}", wrap = "Authorize::ownership(\"user_id\")")]
pub async fn get_user(
    users: web::Data<UserService>,
    user_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let user = users.get_user(&user_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(UserResponse::from(user))))
}

#[put("/{user_id}", wrap = "Authorize::ownership(\"user_id\")")]
pub async fn update_user(
    users: web::Data<UserService>,
    user_id: web::Path<String>,
    payload: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let user = users.update_user(&user_id, payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(UserResponse::from(user))))
}

/// 계정 삭제 (삭제 표시와 전체 세션 무효화)
#[delete("/{user_id}", wrap = "Authorize::ownership(\"user_id\")")]
pub async fn delete_user(
    users: web::Data<UserService>,
    user_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let user = users.delete_user(&user_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        UserResponse::from(user),
        "사용자가 삭제되었습니다",
    )))
}

#[patch("/{user_id}/status", wrap = "Authorize::role(\"ADMIN\")")]
pub async fn update_user_status(
    users: web::Data<UserService>,
    user_id: web::Path<String>,
    payload: web::Json<UpdateUserStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let user = users.update_status(&user_id, payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(UserResponse::from(user))))
}
