//! Route assembly for the API and auth services, plus system endpoints.

use std::sync::Arc;

use auth::api::require_token;
use auth::service::TokenService;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{middleware, Router};
use eventide_core::Module;
use tracing::info;

/// API version prefix every module is mounted under.
pub const API_PREFIX: &str = "/v1";

/// `/v1/...` from every module, gated by token checks when `tokens` is set.
/// System endpoints stay public.
pub fn api_router(modules: &[&dyn Module], tokens: Option<Arc<TokenService>>) -> Router {
    let mut v1 = Router::new();
    for module in modules {
        info!("Mounting {} module under {}", module.name(), API_PREFIX);
        v1 = v1.merge(module.routes());
    }
    if let Some(tokens) = tokens {
        v1 = v1.layer(middleware::from_fn_with_state(tokens, require_token));
    }

    Router::new()
        .nest(API_PREFIX, v1)
        .merge(system_routes())
}

pub fn auth_router(module: &dyn Module) -> Router {
    info!("Mounting {} module", module.name());
    module.routes().merge(system_routes())
}

fn system_routes() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
}

async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
    }))
}

async fn version() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": "eventided",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth::service::AuthConfig;
    use auth::AuthModule;
    use axum::http::StatusCode;
    use eventide_testing::{call, call_with};
    use policy::PolicyModule;

    #[tokio::test]
    async fn system_routes_are_public() {
        let (kv, _dir) = eventide_testing::temp_kv();
        let policy = PolicyModule::new(kv.clone());
        let tokens = Arc::new(TokenService::new(kv, 60));
        let app = api_router(&[&policy], Some(tokens));

        let (status, body) = call(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = call(&app, "GET", "/version", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "eventided");
    }

    #[tokio::test]
    async fn api_requires_token_when_enabled() {
        let (kv, _dir) = eventide_testing::temp_kv();
        let policy = PolicyModule::new(kv.clone());
        let tokens = Arc::new(TokenService::new(kv, 60));
        let token = tokens.create_token("alice", None, Default::default()).unwrap();
        let app = api_router(&[&policy], Some(tokens));

        let (status, _) = call(&app, "GET", "/v1/policies", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let resp = call_with(
            &app,
            "GET",
            "/v1/policies",
            &[("X-Auth-Token", token.token.as_str())],
            None,
        )
        .await;
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.header("X-Total-Count"), Some("0"));
    }

    #[tokio::test]
    async fn api_is_open_when_auth_disabled() {
        let (kv, _dir) = eventide_testing::temp_kv();
        let policy = PolicyModule::new(kv);
        let app = api_router(&[&policy], None);

        let (status, body) = call(&app, "GET", "/v1/policytypes", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn auth_router_serves_tokens_and_health() {
        let (kv, _dir) = eventide_testing::temp_kv();
        let module = AuthModule::new(kv, AuthConfig::default(), None).unwrap();
        let app = auth_router(&module);

        let resp = call_with(&app, "POST", "/tokens", &[("X-Remote-User", "ops")], None).await;
        assert_eq!(resp.status, StatusCode::CREATED);
        let (status, _) = call(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
    }
}
