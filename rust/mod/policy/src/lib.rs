//! Policy module: policy types and the policies applying them to resources.
//!
//! # Resources
//!
//! - **PolicyType**: a class of policy with an implementation module and a
//!   parameter schema. Registered from content packs; read-only over HTTP.
//! - **Policy**: a policy type applied to one resource (`resource_ref`)
//!   with concrete parameters. Addressed by id or `pack.name`.
//!
//! # Usage
//!
//! ```ignore
//! use policy::PolicyModule;
//!
//! let module = PolicyModule::new(kv);
//! let router = module.routes(); // Mount under /v1
//! ```

pub mod api;
pub mod diff;
pub mod loader;
pub mod model;
pub mod registrar;
pub mod service;

use std::sync::Arc;

use axum::Router;
use eventide_core::Module;
use eventide_kv::KVStore;

use crate::service::PolicyService;

pub use crate::diff::{diff_packs, DiffReport, Drift, DriftKind};
pub use crate::registrar::{PolicyRegistrar, RegisterSummary, RegistrarError};

pub struct PolicyModule {
    service: Arc<PolicyService>,
}

impl PolicyModule {
    pub fn new(kv: Arc<dyn KVStore>) -> Self {
        Self { service: PolicyService::new(kv) }
    }

    pub fn service(&self) -> &Arc<PolicyService> {
        &self.service
    }
}

impl Module for PolicyModule {
    fn name(&self) -> &str {
        "policy"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
