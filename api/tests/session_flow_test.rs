//! Login, protected access, refresh rotation and logout over HTTP

mod common;

use actix_web::{http::header, test};
use serde_json::{json, Value};

use common::{bearer, login, post_json, test_config, TestContext};
use cs_api::create_app;
use cs_core::domain::entities::Role;
use cs_shared::Environment;

#[actix_web::test]
async fn test_login_access_and_refresh_rotation() {
    let ctx = TestContext::new();
    ctx.seed_user("alice", Role::User).await;
    let app = test::init_service(create_app(ctx.state.clone(), Environment::Test)).await;

    let (access, refresh) = login(&app, &ctx, "alice").await;

    let req = bearer(test::TestRequest::get().uri(&ctx.api("/users/me")), &access).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let profile: Value = test::read_body_json(resp).await;
    assert_eq!(profile["username"], "alice");
    assert_eq!(profile["role"], "USER");
    assert!(profile.get("passwordHash").is_none());

    let req = post_json(&ctx.api("/auth/refresh"), json!({ "refreshToken": refresh })).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let rotated: Value = test::read_body_json(resp).await;
    assert_eq!(rotated["tokenType"], "Bearer");
    assert_eq!(rotated["expiresIn"], 900);
    assert_ne!(rotated["refreshToken"].as_str().unwrap(), refresh);

    // The consumed token is refused
    let req = post_json(&ctx.api("/auth/refresh"), json!({ "refreshToken": refresh })).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "TOKEN_REVOKED");
    assert_eq!(body["details"]["kind"], "Revoked");

    // Reuse ended the whole family, including the token it was rotated into
    let req = post_json(
        &ctx.api("/auth/refresh"),
        json!({ "refreshToken": rotated["refreshToken"] }),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn test_login_failures_are_generic() {
    let ctx = TestContext::new();
    ctx.seed_user("alice", Role::User).await;
    let app = test::init_service(create_app(ctx.state.clone(), Environment::Test)).await;

    let wrong_password = post_json(
        &ctx.api("/auth/login"),
        json!({ "username": "alice", "password": "not-the-password1" }),
    )
    .to_request();
    let resp = test::call_service(&app, wrong_password).await;
    assert_eq!(resp.status(), 401);
    let first: Value = test::read_body_json(resp).await;

    let unknown_user = post_json(
        &ctx.api("/auth/login"),
        json!({ "username": "mallory", "password": "not-the-password1" }),
    )
    .to_request();
    let resp = test::call_service(&app, unknown_user).await;
    assert_eq!(resp.status(), 401);
    let second: Value = test::read_body_json(resp).await;

    assert_eq!(first["error"], "INVALID_CREDENTIALS");
    assert_eq!(first["error"], second["error"]);
    assert_eq!(first["message"], second["message"]);
}

#[actix_web::test]
async fn test_missing_or_invalid_bearer_is_rejected() {
    let ctx = TestContext::new();
    let app = test::init_service(create_app(ctx.state.clone(), Environment::Test)).await;

    let req = test::TestRequest::get().uri(&ctx.api("/users/me")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "UNAUTHORIZED");

    let req = bearer(test::TestRequest::get().uri(&ctx.api("/users/me")), "not-a-jwt").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["details"]["kind"], "Malformed");

    let req = test::TestRequest::get()
        .uri(&ctx.api("/users/me"))
        .insert_header((header::AUTHORIZATION, "Basic YWxpY2U6cGFzcw=="))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn test_refresh_token_is_not_an_access_token() {
    let ctx = TestContext::new();
    ctx.seed_user("alice", Role::User).await;
    let app = test::init_service(create_app(ctx.state.clone(), Environment::Test)).await;
    let (_, refresh) = login(&app, &ctx, "alice").await;

    let req = bearer(test::TestRequest::get().uri(&ctx.api("/users/me")), &refresh).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn test_logout_is_idempotent() {
    let ctx = TestContext::new();
    ctx.seed_user("alice", Role::User).await;
    let app = test::init_service(create_app(ctx.state.clone(), Environment::Test)).await;
    let (_, refresh) = login(&app, &ctx, "alice").await;

    for _ in 0..2 {
        let req = post_json(&ctx.api("/auth/logout"), json!({ "refreshToken": refresh })).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 204);
    }

    let req = post_json(&ctx.api("/auth/logout"), json!({ "refreshToken": "garbage" })).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 204);

    let req = post_json(&ctx.api("/auth/refresh"), json!({ "refreshToken": refresh })).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn test_logout_all_ends_every_session() {
    let ctx = TestContext::new();
    ctx.seed_user("alice", Role::User).await;
    let app = test::init_service(create_app(ctx.state.clone(), Environment::Test)).await;
    let (access, first_refresh) = login(&app, &ctx, "alice").await;
    let (_, second_refresh) = login(&app, &ctx, "alice").await;

    let req = test::TestRequest::post().uri(&ctx.api("/auth/logout-all"));
    let resp = test::call_service(&app, bearer(req, &access).to_request()).await;
    assert_eq!(resp.status(), 204);

    for refresh in [first_refresh, second_refresh] {
        let req = post_json(&ctx.api("/auth/refresh"), json!({ "refreshToken": refresh })).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
    }

    let req = test::TestRequest::post().uri(&ctx.api("/auth/logout-all")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn test_access_token_expires() {
    let mut config = test_config();
    config.auth.access_token_ttl_seconds = 1;
    let ctx = TestContext::with_config(config);
    ctx.seed_user("alice", Role::User).await;
    let app = test::init_service(create_app(ctx.state.clone(), Environment::Test)).await;
    let (access, refresh) = login(&app, &ctx, "alice").await;

    tokio::time::sleep(std::time::Duration::from_millis(2100)).await;

    let req = bearer(test::TestRequest::get().uri(&ctx.api("/users/me")), &access).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["details"]["kind"], "Expired");

    // The refresh token outlives it and still yields a working pair
    let req = post_json(&ctx.api("/auth/refresh"), json!({ "refreshToken": refresh })).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let pair: Value = test::read_body_json(resp).await;

    let req = bearer(
        test::TestRequest::get().uri(&ctx.api("/users/me")),
        pair["accessToken"].as_str().unwrap(),
    )
    .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);
}
