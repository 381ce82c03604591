//! Concurrent use of one refresh token

mod common;

use actix_web::test;
use futures_util::future::join_all;
use serde_json::{json, Value};

use common::{login, post_json, TestContext};
use cs_api::create_app;
use cs_core::domain::entities::Role;
use cs_shared::Environment;

#[actix_web::test]
async fn test_concurrent_refresh_has_one_winner() {
    let ctx = TestContext::new();
    ctx.seed_user("alice", Role::User).await;
    let app = test::init_service(create_app(ctx.state.clone(), Environment::Test)).await;
    let (_, refresh) = login(&app, &ctx, "alice").await;

    let calls = (0..4).map(|_| {
        let req = post_json(&ctx.api("/auth/refresh"), json!({ "refreshToken": refresh })).to_request();
        test::call_service(&app, req)
    });
    let responses = join_all(calls).await;

    let mut succeeded = 0;
    for resp in responses {
        match resp.status().as_u16() {
            200 => succeeded += 1,
            401 => {
                let body: Value = test::read_body_json(resp).await;
                assert_eq!(body["details"]["kind"], "Revoked");
            }
            other => panic!("unexpected status {}", other),
        }
    }
    assert_eq!(succeeded, 1);
}
