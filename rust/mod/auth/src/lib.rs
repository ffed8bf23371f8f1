//! Auth module: access tokens for the API service.
//!
//! # Resources
//!
//! - **Token**: an opaque access token issued to a user, valid until its
//!   expiry. `POST /tokens` issues one; the API service checks it on every
//!   request when authentication is enabled.
//!
//! # Modes
//!
//! - `proxy`: trust the user name a fronting proxy puts in `X-Remote-User`.
//! - `standalone`: check HTTP Basic credentials against a users file.

pub mod api;
pub mod backend;
pub mod mode;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;
use eventide_core::{Module, ServiceError};
use eventide_kv::KVStore;

use crate::backend::AuthBackend;
use crate::service::{AuthConfig, AuthService};

pub use crate::mode::{AuthMode, VALID_MODES};

pub struct AuthModule {
    service: Arc<AuthService>,
}

impl AuthModule {
    pub fn new(
        kv: Arc<dyn KVStore>,
        config: AuthConfig,
        backend: Option<Arc<dyn AuthBackend>>,
    ) -> Result<Self, ServiceError> {
        let service = AuthService::new(kv, config, backend)?;
        Ok(Self { service })
    }

    pub fn service(&self) -> &Arc<AuthService> {
        &self.service
    }
}

impl Module for AuthModule {
    fn name(&self) -> &str {
        "auth"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
