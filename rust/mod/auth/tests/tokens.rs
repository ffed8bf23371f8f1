use std::sync::Arc;

use auth::api::require_token;
use auth::backend::{hash_password, FlatFileBackend};
use auth::service::AuthConfig;
use auth::{AuthModule, AuthMode};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use base64::Engine;
use eventide_core::Module;
use eventide_testing::call_with;
use serde_json::json;

fn proxy_module() -> (AuthModule, tempfile::TempDir) {
    let (kv, dir) = eventide_testing::temp_kv();
    let config = AuthConfig { mode: AuthMode::Proxy, token_ttl: 3600 };
    (AuthModule::new(kv, config, None).unwrap(), dir)
}

#[tokio::test]
async fn proxy_mode_issues_tokens() {
    let (module, _dir) = proxy_module();
    let router = module.routes();

    let resp = call_with(&router, "POST", "/tokens", &[("X-Remote-User", "alice")], None).await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.json["user"], "alice");
    assert!(resp.json["token"].as_str().is_some());
    assert!(resp.json["expiry"].as_str().is_some());
    assert!(resp.json["id"].as_str().is_some());

    let resp = call_with(&router, "POST", "/tokens", &[], None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.json["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn ttl_is_validated() {
    let (module, _dir) = proxy_module();
    let router = module.routes();

    let resp = call_with(
        &router,
        "POST",
        "/tokens",
        &[("X-Remote-User", "alice")],
        Some(json!({"ttl": -1})),
    )
    .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = call_with(
        &router,
        "POST",
        "/tokens",
        &[("X-Remote-User", "alice")],
        Some(json!({"ttl": 60})),
    )
    .await;
    assert_eq!(resp.status, StatusCode::CREATED);
}

#[tokio::test]
async fn standalone_mode_uses_basic_auth() {
    let (kv, _dir) = eventide_testing::temp_kv();
    let backend = FlatFileBackend::parse(&format!("bob:{}\n", hash_password("pw").unwrap()));
    let config = AuthConfig { mode: AuthMode::Standalone, token_ttl: 3600 };
    let module = AuthModule::new(kv, config, Some(Arc::new(backend))).unwrap();
    let router = module.routes();

    let good = format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode("bob:pw")
    );
    let resp = call_with(&router, "POST", "/tokens", &[("Authorization", good.as_str())], None).await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.json["user"], "bob");

    let bad = format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode("bob:guess")
    );
    let resp = call_with(&router, "POST", "/tokens", &[("Authorization", bad.as_str())], None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let (module, _dir) = proxy_module();
    let tokens = module.service().tokens().clone();
    let token = tokens.create_token("alice", None, Default::default()).unwrap();

    let protected = Router::new()
        .route("/v1/ping", get(|| async { Json(json!({"ok": true})) }))
        .layer(axum::middleware::from_fn_with_state(tokens, require_token));

    let resp = call_with(&protected, "GET", "/v1/ping", &[], None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let resp = call_with(&protected, "GET", "/v1/ping", &[("X-Auth-Token", "bogus")], None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let resp = call_with(&protected, "GET", "/v1/ping", &[("X-Auth-Token", token.token.as_str())], None).await;
    assert_eq!(resp.status, StatusCode::OK);

    let uri = format!("/v1/ping?x-auth-token={}", token.token);
    let resp = call_with(&protected, "GET", &uri, &[], None).await;
    assert_eq!(resp.status, StatusCode::OK);
}
