mod policies;

use std::sync::Arc;

use axum::Router;

use crate::service::PolicyService;

/// Shared application state.
pub type AppState = Arc<PolicyService>;

/// Build the policy API router.
///
/// All routes are relative; the caller nests them under `/v1`.
pub fn build_router(svc: Arc<PolicyService>) -> Router {
    Router::new()
        .merge(svc.policy_types_controller().router())
        .merge(svc.policies_controller().router())
        .merge(policies::routes().with_state(svc))
}
