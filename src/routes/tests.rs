//! HTTP 계층 테스트
//!
//! 프로세스 내 저장소로 조립한 컨텍스트에 실제 라우트와 앱 미들웨어를 올려 검증합니다.

use std::time::Duration;

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::test::{self, TestRequest};
use actix_web::{middleware, rt, web, App, HttpResponse};
use serde_json::{json, Value};

use super::configure_routes;
use crate::core::context::testing::TestContext;
use crate::middlewares::{RequestIdMiddleware, RequestTimeout, IDEMPOTENCY_KEY_HEADER, REQUEST_ID_HEADER};

const PASSWORD: &str = "Passw0rd!";

macro_rules! test_app {
    ($ctx:expr) => {{
        let app_ctx = $ctx.app.clone();
        test::init_service(
            App::new()
                .configure(|cfg| app_ctx.register(cfg))
                .configure(|cfg| configure_routes(cfg, 64 * 1024))
                .wrap(RequestTimeout::new(Duration::from_secs(5)))
                .wrap(RequestIdMiddleware)
                .wrap(middleware::NormalizePath::trim()),
        )
        .await
    }};
}

async fn call<S, R, B>(app: &S, req: R) -> (StatusCode, Value)
where
    S: Service<R, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let res = test::call_service(app, req).await;
    let status = res.status();
    let bytes = test::read_body(res).await;
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

fn register_req(email: &str) -> TestRequest {
    TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({ "email": email, "name": "Alice", "password": PASSWORD }))
}

fn login_req(email: &str) -> TestRequest {
    TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "email": email, "password": PASSWORD }))
}

/// 회원가입 후 (user_id, access, refresh)
struct Session {
    user_id: String,
    access: String,
    refresh: String,
}

impl Session {
    fn from_body(body: &Value) -> Self {
        Self {
            user_id: body["data"]["user"]["id"].as_str().unwrap().to_string(),
            access: body["data"]["tokens"]["access_token"].as_str().unwrap().to_string(),
            refresh: body["data"]["tokens"]["refresh_token"].as_str().unwrap().to_string(),
        }
    }
}

macro_rules! register {
    ($app:expr, $email:expr) => {{
        let (status, body) = call(&$app, register_req($email).to_request()).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        Session::from_body(&body)
    }};
}

macro_rules! register_admin {
    ($ctx:expr, $app:expr, $email:expr) => {{
        let session = register!($app, $email);
        assert!($ctx.app.role_service.bootstrap_admin($email).await.unwrap());
        session
    }};
}

#[actix_web::test]
async fn test_register_verify_login_flow() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);

    let session = register!(app, "a@x.io");
    ctx.mail.wait_for("a@x.io", 1).await;
    let token = ctx.mail.last_token_for("a@x.io").unwrap();

    let req = TestRequest::post()
        .uri("/api/v1/auth/verify-email")
        .set_json(json!({ "token": token }))
        .to_request();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_verified"], true);

    let (status, body) = call(&app, login_req("a@x.io").to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["user"]["id"], session.user_id.as_str());
    assert_eq!(body["data"]["user"]["is_active"], true);
    assert_eq!(body["data"]["tokens"]["token_type"], "Bearer");
    assert!(body["data"]["user"].get("password_hash").is_none());

    // 같은 토큰은 두 번 쓸 수 없습니다
    let req = TestRequest::post()
        .uri("/api/v1/auth/verify-email")
        .set_json(json!({ "token": token }))
        .to_request();
    let (status, _) = call(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_register_rejects_invalid_fields_and_duplicates() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);

    let req = TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({ "email": "nope", "name": "", "password": "short" }))
        .to_request();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["type"], "VALIDATION_ERROR");
    assert!(body["error"]["details"].get("email").is_some());
    assert!(body["error"]["details"].get("password").is_some());

    register!(app, "a@x.io");
    let (status, body) = call(&app, register_req("  A@X.IO ").to_request()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["type"], "CONFLICT");
}

#[actix_web::test]
async fn test_login_failures_are_indistinguishable() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    register!(app, "a@x.io");

    let wrong_password = TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "email": "a@x.io", "password": "Wrong0rd!" }))
        .to_request();
    let (status_a, body_a) = call(&app, wrong_password).await;
    let (status_b, body_b) = call(&app, login_req("absent@x.io").to_request()).await;

    assert_eq!(status_a, StatusCode::UNAUTHORIZED);
    assert_eq!(status_b, StatusCode::UNAUTHORIZED);
    assert_eq!(body_a["error"], body_b["error"]);
}

#[actix_web::test]
async fn test_refresh_rotation_rejects_reuse() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    let session = register!(app, "a@x.io");

    let refresh = |token: &str| {
        TestRequest::post()
            .uri("/api/v1/auth/refresh")
            .set_json(json!({ "refresh_token": token }))
            .to_request()
    };

    let (status, body) = call(&app, refresh(&session.refresh)).await;
    assert_eq!(status, StatusCode::OK);
    let r2 = body["data"]["tokens"]["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(r2, session.refresh);

    let (status, body) = call(&app, refresh(&session.refresh)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["type"], "UNAUTHORIZED");

    let (status, _) = call(&app, refresh(&r2)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, refresh(&r2)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_logout_all_invalidates_every_session() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    register!(app, "a@x.io");

    let (_, first) = call(&app, login_req("a@x.io").to_request()).await;
    let (_, second) = call(&app, login_req("a@x.io").to_request()).await;
    let a1 = Session::from_body(&first).access;
    let a2 = Session::from_body(&second).access;

    let profile = |token: &str| {
        TestRequest::get()
            .uri("/api/v1/auth/profile")
            .insert_header(bearer(token))
            .to_request()
    };
    let (status, body) = call(&app, profile(&a2)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["roles"], json!(["USER"]));

    let req = TestRequest::post()
        .uri("/api/v1/auth/logout-all")
        .insert_header(bearer(&a1))
        .to_request();
    let (status, _) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(call(&app, profile(&a1)).await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(call(&app, profile(&a2)).await.0, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_logout_revokes_access_and_supplied_refresh() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    let session = register!(app, "a@x.io");

    let req = TestRequest::post()
        .uri("/api/v1/auth/logout")
        .insert_header(bearer(&session.access))
        .set_json(json!({ "refresh_token": session.refresh }))
        .to_request();
    let (status, _) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);

    let req = TestRequest::get()
        .uri("/api/v1/auth/permissions")
        .insert_header(bearer(&session.access))
        .to_request();
    assert_eq!(call(&app, req).await.0, StatusCode::UNAUTHORIZED);

    let req = TestRequest::post()
        .uri("/api/v1/auth/refresh")
        .set_json(json!({ "refresh_token": session.refresh }))
        .to_request();
    assert_eq!(call(&app, req).await.0, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_change_password_reissues_tokens() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    let session = register!(app, "a@x.io");

    let req = TestRequest::put()
        .uri("/api/v1/auth/change-password")
        .insert_header(bearer(&session.access))
        .set_json(json!({ "old_password": PASSWORD, "new_password": "N3wPassw0rd!" }))
        .to_request();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    let fresh = body["data"]["tokens"]["access_token"].as_str().unwrap().to_string();

    let profile = |token: &str| {
        TestRequest::get()
            .uri("/api/v1/auth/profile")
            .insert_header(bearer(token))
            .to_request()
    };
    assert_eq!(call(&app, profile(&session.access)).await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(call(&app, profile(&fresh)).await.0, StatusCode::OK);
}

#[actix_web::test]
async fn test_reset_password_response_does_not_reveal_account() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    register!(app, "exists@x.io");

    let reset = |email: &str| {
        TestRequest::post()
            .uri("/api/v1/auth/reset-password")
            .set_json(json!({ "email": email }))
            .to_request()
    };
    let (status_a, body_a) = call(&app, reset("exists@x.io")).await;
    let (status_b, body_b) = call(&app, reset("absent@x.io")).await;

    assert_eq!(status_a, StatusCode::OK);
    assert_eq!(status_b, StatusCode::OK);
    assert_eq!(body_a["success"], body_b["success"]);
    assert_eq!(body_a["message"], body_b["message"]);
    assert!(body_a.get("data").is_none() && body_b.get("data").is_none());

    // 가입 인증 메일 + 재설정 메일
    let sent = ctx.mail.wait_for("exists@x.io", 2).await;
    assert_eq!(sent.len(), 2);
    assert!(ctx.mail.sent_to("absent@x.io").is_empty());

    let token = ctx.mail.last_token_for("exists@x.io").unwrap();
    let req = TestRequest::post()
        .uri("/api/v1/auth/confirm-reset")
        .set_json(json!({ "token": token, "new_password": "N3wPassw0rd!" }))
        .to_request();
    assert_eq!(call(&app, req).await.0, StatusCode::OK);

    let req = TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "email": "exists@x.io", "password": "N3wPassw0rd!" }))
        .to_request();
    assert_eq!(call(&app, req).await.0, StatusCode::OK);
}

#[actix_web::test]
async fn test_missing_and_malformed_tokens_are_unauthorized() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);

    let req = TestRequest::get().uri("/api/v1/auth/profile").to_request();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["type"], "UNAUTHORIZED");

    let req = TestRequest::get()
        .uri("/api/v1/users/anything")
        .insert_header((header::AUTHORIZATION, "Token abc"))
        .to_request();
    assert_eq!(call(&app, req).await.0, StatusCode::UNAUTHORIZED);

    let req = TestRequest::get()
        .uri("/api/v1/rbac/roles")
        .insert_header(bearer("not.a.jwt"))
        .to_request();
    assert_eq!(call(&app, req).await.0, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_idempotent_post_rejects_replay() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    let admin = register_admin!(ctx, app, "admin@x.io");

    let create_user = || {
        TestRequest::post()
            .uri("/api/v1/users")
            .insert_header(bearer(&admin.access))
            .insert_header((IDEMPOTENCY_KEY_HEADER, "k1"))
            .set_json(json!({ "email": "bob@x.io", "name": "Bob", "password": PASSWORD }))
            .to_request()
    };

    let (status, body) = call(&app, create_user()).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);

    let (status, body) = call(&app, create_user()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "DUPLICATE_REQUEST");

    // 같은 키, 다른 경로
    let req = TestRequest::post()
        .uri("/api/v1/rbac/roles")
        .insert_header(bearer(&admin.access))
        .insert_header((IDEMPOTENCY_KEY_HEADER, "k1"))
        .set_json(json!({ "name": "editor" }))
        .to_request();
    assert_eq!(call(&app, req).await.0, StatusCode::CREATED);

    // 읽기 요청은 키를 무시합니다
    for _ in 0..2 {
        let req = TestRequest::get()
            .uri("/api/v1/rbac/roles")
            .insert_header(bearer(&admin.access))
            .insert_header((IDEMPOTENCY_KEY_HEADER, "k1"))
            .to_request();
        let (status, body) = call(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        // ADMIN, MODERATOR, USER 시드 + EDITOR
        assert_eq!(body["meta"]["total"], 4);
    }
}

#[actix_web::test]
async fn test_idempotency_key_length_is_bounded() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);

    let req = register_req("a@x.io")
        .insert_header((IDEMPOTENCY_KEY_HEADER, "k".repeat(256)))
        .to_request();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "VALIDATION_ERROR");
}

#[actix_web::test]
async fn test_permission_grant_revocation_applies_immediately() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    let admin = register_admin!(ctx, app, "admin@x.io");
    let user = register!(app, "u@x.io");

    let post = |uri: &str, body: Value| {
        TestRequest::post()
            .uri(uri)
            .insert_header(bearer(&admin.access))
            .set_json(body)
            .to_request()
    };

    let (_, role) = call(&app, post("/api/v1/rbac/roles", json!({ "name": "editor" }))).await;
    let role_id = role["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(role["data"]["name"], "EDITOR");

    let (_, permission) = call(
        &app,
        post("/api/v1/rbac/permissions", json!({ "resource": "articles", "action": "update" })),
    )
    .await;
    let permission_id = permission["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(permission["data"]["name"], "articles:update");

    let grant_uri = format!("/api/v1/rbac/roles/{}/permissions/{}", role_id, permission_id);
    let (status, _) = call(&app, post(&grant_uri, json!({}))).await;
    assert_eq!(status, StatusCode::CREATED);

    let assign_uri = format!("/api/v1/rbac/users/{}/roles", user.user_id);
    let (status, body) = call(&app, post(&assign_uri, json!({ "role_id": role_id }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["role_name"], "EDITOR");
    assert_eq!(body["data"]["is_effective"], true);

    let check_uri = format!("/api/v1/rbac/users/{}/permissions/check", user.user_id);
    let check = json!({ "permissions": ["articles:update", "articles:delete"] });
    let (status, body) = call(&app, post(&check_uri, check.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["articles:update"], true);
    assert_eq!(body["data"]["articles:delete"], false);

    let req = TestRequest::delete()
        .uri(&grant_uri)
        .insert_header(bearer(&admin.access))
        .to_request();
    assert_eq!(call(&app, req).await.0, StatusCode::OK);

    let (_, body) = call(&app, post(&check_uri, check)).await;
    assert_eq!(body["data"]["articles:update"], false);
}

#[actix_web::test]
async fn test_sync_role_permissions_replaces_set() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    let admin = register_admin!(ctx, app, "admin@x.io");

    let send = |req: TestRequest| req.insert_header(bearer(&admin.access)).to_request();

    let (_, role) = call(&app, send(TestRequest::post().uri("/api/v1/rbac/roles").set_json(json!({ "name": "auditor" })))).await;
    let role_id = role["data"]["id"].as_str().unwrap().to_string();

    let (_, permissions) = call(&app, send(TestRequest::get().uri("/api/v1/rbac/permissions"))).await;
    let ids: Vec<String> = permissions["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|p| p["action"] == "read")
        .map(|p| p["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids.len(), 3);

    let uri = format!("/api/v1/rbac/roles/{}/permissions", role_id);
    for _ in 0..2 {
        let req = send(TestRequest::put().uri(&uri).set_json(json!({ "permission_ids": ids })));
        let (status, body) = call(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 3);
    }

    let req = send(TestRequest::put().uri(&uri).set_json(json!({ "permission_ids": ["missing"] })));
    let (status, _) = call(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = call(&app, send(TestRequest::get().uri(&uri))).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}

#[actix_web::test]
async fn test_rbac_routes_require_permission() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    let user = register!(app, "u@x.io");

    let req = TestRequest::get()
        .uri("/api/v1/rbac/roles")
        .insert_header(bearer(&user.access))
        .to_request();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["type"], "FORBIDDEN");

    let req = TestRequest::post()
        .uri("/api/v1/rbac/user-roles/cleanup")
        .insert_header(bearer(&user.access))
        .to_request();
    assert_eq!(call(&app, req).await.0, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_user_routes_enforce_ownership() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    let admin = register_admin!(ctx, app, "admin@x.io");
    let alice = register!(app, "alice@x.io");
    let bob = register!(app, "bob@x.io");

    let get = |token: &str, id: &str| {
        TestRequest::get()
            .uri(&format!("/api/v1/users/{}", id))
            .insert_header(bearer(token))
            .to_request()
    };

    assert_eq!(call(&app, get(&alice.access, &alice.user_id)).await.0, StatusCode::OK);
    assert_eq!(call(&app, get(&alice.access, &bob.user_id)).await.0, StatusCode::FORBIDDEN);
    assert_eq!(call(&app, get(&admin.access, &bob.user_id)).await.0, StatusCode::OK);

    let update = |version: i64| {
        TestRequest::put()
            .uri(&format!("/api/v1/users/{}", alice.user_id))
            .insert_header(bearer(&alice.access))
            .set_json(json!({ "name": "Alice Kim", "version": version }))
            .to_request()
    };
    let (status, body) = call(&app, update(1)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Alice Kim");
    assert_eq!(body["data"]["version"], 2);
    assert_eq!(call(&app, update(1)).await.0, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn test_user_creation_uses_method_derived_permission() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    let user = register!(app, "u@x.io");

    let req = TestRequest::post()
        .uri("/api/v1/users")
        .insert_header(bearer(&user.access))
        .set_json(json!({ "email": "bob@x.io", "name": "Bob", "password": PASSWORD }))
        .to_request();
    assert_eq!(call(&app, req).await.0, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_admin_deactivation_ends_sessions() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    let admin = register_admin!(ctx, app, "admin@x.io");
    let user = register!(app, "u@x.io");

    let status_req = |token: &str, is_active: bool| {
        TestRequest::patch()
            .uri(&format!("/api/v1/users/{}/status", user.user_id))
            .insert_header(bearer(token))
            .set_json(json!({ "is_active": is_active }))
            .to_request()
    };

    assert_eq!(call(&app, status_req(&user.access, false)).await.0, StatusCode::FORBIDDEN);

    let (status, body) = call(&app, status_req(&admin.access, false)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], false);

    let req = TestRequest::get()
        .uri("/api/v1/auth/profile")
        .insert_header(bearer(&user.access))
        .to_request();
    assert_eq!(call(&app, req).await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(call(&app, login_req("u@x.io").to_request()).await.0, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_request_id_is_accepted_or_generated() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);

    let req = TestRequest::get()
        .uri("/health")
        .insert_header((REQUEST_ID_HEADER, "req-abc-123"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.headers().get(REQUEST_ID_HEADER).unwrap(), "req-abc-123");

    let req = TestRequest::get()
        .uri("/health")
        .insert_header((REQUEST_ID_HEADER, "x".repeat(129)))
        .to_request();
    let res = test::call_service(&app, req).await;
    let generated = res.headers().get(REQUEST_ID_HEADER).unwrap().to_str().unwrap().to_string();
    assert_eq!(generated.len(), 36);
    assert!(uuid::Uuid::parse_str(&generated).is_ok());

    // 에러 응답에도 붙습니다
    let req = TestRequest::get().uri("/api/v1/auth/profile").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().contains_key(REQUEST_ID_HEADER));
}

#[actix_web::test]
async fn test_health_and_jwks() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);

    let (status, body) = call(&app, TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"], "memory");

    let (status, body) = call(&app, TestRequest::get().uri("/.well-known/jwks.json").to_request()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["type"], "NOT_FOUND");
}

#[actix_web::test]
async fn test_json_body_errors_use_envelope() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);

    let req = TestRequest::post()
        .uri("/api/v1/auth/login")
        .insert_header((header::CONTENT_TYPE, "text/plain"))
        .set_payload("email=a@x.io")
        .to_request();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["error"]["code"], "UNSUPPORTED_MEDIA_TYPE");

    let req = TestRequest::post()
        .uri("/api/v1/auth/login")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "VALIDATION_ERROR");

    let big = "x".repeat(70 * 1024);
    let req = TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "email": "a@x.io", "password": big }))
        .to_request();
    assert_eq!(call(&app, req).await.0, StatusCode::PAYLOAD_TOO_LARGE);
}

#[actix_web::test]
async fn test_slow_handler_times_out() {
    let app = test::init_service(
        App::new()
            .wrap(RequestTimeout::new(Duration::from_millis(20)))
            .wrap(RequestIdMiddleware)
            .route(
                "/slow",
                web::get().to(|| async {
                    rt::time::sleep(Duration::from_millis(500)).await;
                    HttpResponse::Ok().finish()
                }),
            )
            .route("/fast", web::get().to(|| async { HttpResponse::Ok().finish() })),
    )
    .await;

    let (status, body) = call(&app, TestRequest::get().uri("/slow").to_request()).await;
    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(body["error"]["code"], "REQUEST_TIMEOUT");

    let (status, _) = call(&app, TestRequest::get().uri("/fast").to_request()).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn test_profile_and_permissions_list_effective_grants() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    let admin = register_admin!(ctx, app, "admin@x.io");

    let req = TestRequest::get()
        .uri("/api/v1/auth/profile")
        .insert_header(bearer(&admin.access))
        .to_request();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    let names = body["data"]["permissions"].as_array().unwrap();
    assert_eq!(names.len(), 10);
    assert!(names.contains(&json!("roles:manage")));

    let req = TestRequest::get()
        .uri("/api/v1/auth/permissions")
        .insert_header(bearer(&admin.access))
        .to_request();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    let listed = body["data"].as_array().unwrap();
    assert_eq!(listed.len(), 10);
    assert!(listed.iter().any(|p| p["name"] == "users:delete"));
}

#[actix_web::test]
async fn test_unauthenticated_write_does_not_consume_idempotency_key() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    let admin = register_admin!(ctx, app, "admin@x.io");

    let create_role = |token: &str| {
        TestRequest::post()
            .uri("/api/v1/rbac/roles")
            .insert_header(bearer(token))
            .insert_header((IDEMPOTENCY_KEY_HEADER, "retry-1"))
            .set_json(json!({ "name": "auditor" }))
            .to_request()
    };
    assert_eq!(call(&app, create_role("expired.or.bogus")).await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(call(&app, create_role(&admin.access)).await.0, StatusCode::CREATED);
    assert_eq!(call(&app, create_role(&admin.access)).await.0, StatusCode::CONFLICT);

    // 공개 라우트와 스코프를 공유하는 인증 라우트
    let logout = |token: Option<&str>| {
        let mut req = TestRequest::post()
            .uri("/api/v1/auth/logout")
            .insert_header((IDEMPOTENCY_KEY_HEADER, "retry-2"));
        if let Some(token) = token {
            req = req.insert_header(bearer(token));
        }
        req.to_request()
    };
    assert_eq!(call(&app, logout(None)).await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(call(&app, logout(Some(&admin.access))).await.0, StatusCode::OK);
}
