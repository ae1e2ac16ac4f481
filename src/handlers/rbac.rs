//! RBAC 관리 HTTP 핸들러
//!
//! `/api/v1/rbac` 스코프에 등록되며, 모든 라우트는 인증 후 권한 검사를 거칩니다.
//!
//! | 대상 | 읽기 권한 | 쓰기 권한 |
//! |------|-----------|-----------|
//! | 역할, 역할-권한 부여 | `roles:read` | `roles:manage` |
//! | 권한 | `permissions:read` | `permissions:manage` |
//! | 사용자-역할 할당 | `users:manage` | `users:manage` |
//! | 사용자 권한 일괄 확인 | `users:read` | - |

use actix_web::{delete, get, post, put, web, HttpResponse};
use serde_json::json;
use validator::Validate;

use crate::core::context::AppContext;
use crate::core::errors::AppError;
use crate::domain::dto::api_response::ApiResponse;
use crate::domain::dto::rbac::{
    AssignRoleRequest, CheckPermissionsRequest, CleanupResponse, CreatePermissionRequest, CreateRoleRequest,
    PermissionResponse, RoleResponse, SyncRolePermissionsRequest, UpdatePermissionRequest, UpdateRoleRequest,
    UserRoleResponse,
};
use crate::domain::entities::rbac::Permission;
use crate::domain::models::auth::AuthenticatedUser;
use crate::middlewares::Authorize;
use crate::services::rbac::{AuthorizationService, RoleService};

fn permission_list(permissions: Vec<Permission>) -> Vec<PermissionResponse> {
    permissions.into_iter().map(PermissionResponse::from).collect()
}

// ----- 역할 -----

#[post("/roles", wrap = "Authorize::permission(\"roles\", \"manage\")")]
pub async fn create_role(
    roles: web::Data<RoleService>,
    payload: web::Json<CreateRoleRequest>,
) -> Result<HttpResponse, AppError> {
    let role = roles.create_role(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::success(RoleResponse::from(role))))
}

#[get("/roles", wrap = "Authorize::permission(\"roles\", \"read\")")]
pub async fn list_roles(roles: web::Data<RoleService>) -> Result<HttpResponse, AppError> {
    let list: Vec<RoleResponse> = roles.list_roles().await?.into_iter().map(RoleResponse::from).collect();
    let total = list.len();
    Ok(HttpResponse::Ok().json(ApiResponse::success(list).with_meta(json!({ "total": total }))))
}

#[get("/roles/{role_id}", wrap = "Authorize::permission(\"roles\", \"read\")")]
pub async fn get_role(
    roles: web::Data<RoleService>,
    role_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let role = roles.get_role(&role_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(RoleResponse::from(role))))
}

#[put("/roles/{role_id}", wrap = "Authorize::permission(\"roles\", \"manage\")")]
pub async fn update_role(
    roles: web::Data<RoleService>,
    role_id: web::Path<String>,
    payload: web::Json<UpdateRoleRequest>,
) -> Result<HttpResponse, AppError> {
    let role = roles.update_role(&role_id, payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(RoleResponse::from(role))))
}

/// 역할 삭제. 이 역할을 참조하는 부여와 할당은 모두 비활성화됩니다.
#[delete("/roles/{role_id}", wrap = "Authorize::permission(\"roles\", \"manage\")")]
pub async fn delete_role(
    roles: web::Data<RoleService>,
    role_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    roles.delete_role(&role_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message_only("역할이 삭제되었습니다")))
}

// ----- 권한 -----

#[post("/permissions", wrap = "Authorize::permission(\"permissions\", \"manage\")")]
pub async fn create_permission(
    roles: web::Data<RoleService>,
    payload: web::Json<CreatePermissionRequest>,
) -> Result<HttpResponse, AppError> {
    let permission = roles.create_permission(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::success(PermissionResponse::from(permission))))
}

#[get("/permissions", wrap = "Authorize::permission(\"permissions\", \"read\")")]
pub async fn list_permissions(roles: web::Data<RoleService>) -> Result<HttpResponse, AppError> {
    let list = permission_list(roles.list_permissions().await?);
    let total = list.len();
    Ok(HttpResponse::Ok().json(ApiResponse::success(list).with_meta(json!({ "total": total }))))
}

#[put("/permissions/{permission_id}", wrap = "Authorize::permission(\"permissions\", \"manage\")")]
pub async fn update_permission(
    roles: web::Data<RoleService>,
    permission_id: web::Path<String>,
    payload: web::Json<UpdatePermissionRequest>,
) -> Result<HttpResponse, AppError> {
    let permission = roles.update_permission(&permission_id, payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(PermissionResponse::from(permission))))
}

#[delete("/permissions/{permission_id}", wrap = "Authorize::permission(\"permissions\", \"manage\")")]
pub async fn delete_permission(
    roles: web::Data<RoleService>,
    permission_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    roles.delete_permission(&permission_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message_only("권한이 삭제되었습니다")))
}

// ----- 역할-권한 부여 -----

#[get("/roles/{role_id}/permissions", wrap = "Authorize::permission(\"roles\", \"read\")")]
pub async fn role_permissions(
    roles: web::Data<RoleService>,
    role_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let list = permission_list(roles.role_permissions(&role_id).await?);
    Ok(HttpResponse::Ok().json(ApiResponse::success(list)))
}

/// 역할의 권한 집합을 본문 목록으로 교체합니다.
#[put("/roles/{role_id}/permissions", wrap = "Authorize::permission(\"roles\", \"manage\")")]
pub async fn sync_role_permissions(
    roles: web::Data<RoleService>,
    user: AuthenticatedUser,
    role_id: web::Path<String>,
    payload: web::Json<SyncRolePermissionsRequest>,
) -> Result<HttpResponse, AppError> {
    let permissions = roles
        .sync_role_permissions(&role_id, payload.into_inner(), Some(&user.user_id))
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(permission_list(permissions))))
}

#[post(
    "/roles/{role_id}/permissions/{permission_id}",
    wrap = "Authorize::permission(\"roles\", \"manage\")"
)]
pub async fn grant_permission(
    roles: web::Data<RoleService>,
    user: AuthenticatedUser,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (role_id, permission_id) = path.into_inner();
    let grant = roles
        .grant_permission(&role_id, &permission_id, Some(&user.user_id))
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::success(grant)))
}

#[delete(
    "/roles/{role_id}/permissions/{permission_id}",
    wrap = "Authorize::permission(\"roles\", \"manage\")"
)]
pub async fn revoke_permission(
    roles: web::Data<RoleService>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (role_id, permission_id) = path.into_inner();
    if !roles.revoke_permission(&role_id, &permission_id).await? {
        return Err(AppError::NotFound("해당 권한 부여를 찾을 수 없습니다".to_string()));
    }
    Ok(HttpResponse::Ok().json(ApiResponse::message_only("권한 부여가 회수되었습니다")))
}

// ----- 사용자-역할 할당 -----

/// 할당 이력 (만료·비활성 레코드 포함)
#[get("/users/{user_id}/roles", wrap = "Authorize::permission(\"users\", \"manage\")")]
pub async fn user_roles(
    roles: web::Data<RoleService>,
    user_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let history = roles.user_role_history(&user_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(history)))
}

#[post("/users/{user_id}/roles", wrap = "Authorize::permission(\"users\", \"manage\")")]
pub async fn assign_role(
    ctx: web::Data<AppContext>,
    user: AuthenticatedUser,
    user_id: web::Path<String>,
    payload: web::Json<AssignRoleRequest>,
) -> Result<HttpResponse, AppError> {
    let assignment = ctx
        .role_service
        .assign_role(&user_id, payload.into_inner(), Some(&user.user_id))
        .await?;
    let role = ctx.role_service.get_role(&assignment.role_id).await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(UserRoleResponse::new(
        assignment,
        Some(role.name),
        ctx.clock.now(),
    ))))
}

#[delete("/users/{user_id}/roles/{role_id}", wrap = "Authorize::permission(\"users\", \"manage\")")]
pub async fn unassign_role(
    roles: web::Data<RoleService>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (user_id, role_id) = path.into_inner();
    if !roles.unassign_role(&user_id, &role_id).await? {
        return Err(AppError::NotFound("해당 역할 할당을 찾을 수 없습니다".to_string()));
    }
    Ok(HttpResponse::Ok().json(ApiResponse::message_only("역할 할당이 해제되었습니다")))
}

/// 권한 이름 목록에 대한 보유 여부 맵
///
/// ```json
/// { "permissions": ["users:read", "roles:manage"] }
/// ```
#[post("/users/{user_id}/permissions/check", wrap = "Authorize::permission(\"users\", \"read\")")]
pub async fn check_permissions(
    authz: web::Data<AuthorizationService>,
    user_id: web::Path<String>,
    payload: web::Json<CheckPermissionsRequest>,
) -> Result<HttpResponse, AppError> {
    payload.validate()?;
    let result = authz.check_multiple_permissions(&user_id, &payload.permissions).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(result)))
}

#[post("/user-roles/cleanup", wrap = "Authorize::permission(\"roles\", \"manage\")")]
pub async fn cleanup_expired(roles: web::Data<RoleService>) -> Result<HttpResponse, AppError> {
    let deactivated = roles.cleanup_expired().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(CleanupResponse { deactivated })))
}
