use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use eventide_core::ServiceError;
use serde_json::Map;

use crate::api::AppState;
use crate::model::{CreateToken, Token};

pub fn routes() -> Router<AppState> {
    Router::new().route("/tokens", post(create_token))
}

/// The body is optional, so it is parsed by hand instead of through `Json`.
async fn create_token(
    State(svc): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Token>), ServiceError> {
    let user = svc.authenticate(&headers)?;

    let request: CreateToken = if body.iter().all(u8::is_ascii_whitespace) {
        CreateToken::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ServiceError::Validation(format!("Invalid token request: {}", e)))?
    };

    let token = svc.tokens().create_token(&user, request.ttl, Map::new())?;
    Ok((StatusCode::CREATED, Json(token)))
}
