mod middleware;
mod tokens;

use std::sync::Arc;

use axum::Router;

use crate::service::AuthService;

pub use middleware::{require_token, AUTH_TOKEN_HEADER, AUTH_TOKEN_QUERY_PARAM};

/// Shared application state.
pub type AppState = Arc<AuthService>;

/// Build the auth service router. Routes are mounted at the root.
pub fn build_router(svc: Arc<AuthService>) -> Router {
    Router::new().merge(tokens::routes()).with_state(svc)
}
