use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{post, put};
use axum::{Json, Router};
use eventide_core::ServiceError;
use serde_json::Value;

use crate::api::AppState;
use crate::model::PolicyApi;

/// Write side of `/policies`. Reads go through the generic controller.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/policies", post(create_policy))
        .route("/policies/{ref_or_id}", put(update_policy).delete(delete_policy))
}

async fn create_policy(
    State(svc): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<PolicyApi>), ServiceError> {
    let api = PolicyApi::from_value(body)?;
    let created = svc.create_policy(&api)?;
    Ok((StatusCode::CREATED, Json(PolicyApi::from_model(&created))))
}

async fn update_policy(
    State(svc): State<AppState>,
    Path(ref_or_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<PolicyApi>, ServiceError> {
    let api = PolicyApi::from_value(body)?;
    let updated = svc.update_policy(&ref_or_id, &api)?;
    Ok(Json(PolicyApi::from_model(&updated)))
}

async fn delete_policy(
    State(svc): State<AppState>,
    Path(ref_or_id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    svc.delete_policy(&ref_or_id)?;
    Ok(StatusCode::NO_CONTENT)
}
