use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use eventide_core::ServiceError;

use crate::service::TokenService;

pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";
pub const AUTH_TOKEN_QUERY_PARAM: &str = "x-auth-token";

/// Token check for API routes.
///
/// Reads the token from the `X-Auth-Token` header, falling back to the
/// `x-auth-token` query parameter. A missing, unknown or expired token is a
/// 401; a valid one is stored as an extension for handlers.
pub async fn require_token(
    State(tokens): State<Arc<TokenService>>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = match extract_token(&req) {
        Some(t) => t,
        None => {
            return ServiceError::Unauthorized("Token is not provided.".into()).into_response();
        }
    };

    match tokens.validate_token(&token) {
        Ok(found) => {
            req.extensions_mut().insert(found);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}

fn extract_token(req: &Request) -> Option<String> {
    if let Some(v) = req
        .headers()
        .get(AUTH_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
    {
        return Some(v.to_string());
    }

    let Query(params) = Query::<HashMap<String, String>>::try_from_uri(req.uri()).ok()?;
    params
        .get(AUTH_TOKEN_QUERY_PARAM)
        .filter(|v| !v.is_empty())
        .cloned()
}
