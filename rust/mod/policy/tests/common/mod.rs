#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use eventide_core::Module;
use eventide_testing::FixturesLoader;
use policy::model::{PolicyApi, PolicyTypeApi};
use policy::service::PolicyService;
use policy::PolicyModule;

pub const PACK: &str = "generic";

pub struct Harness {
    pub router: Router,
    pub service: Arc<PolicyService>,
    _dir: tempfile::TempDir,
}

/// A `/v1` router over a fresh store seeded with the generic fixtures.
pub fn harness(with_policies: bool) -> Harness {
    let (kv, dir) = eventide_testing::temp_kv();
    let module = PolicyModule::new(kv);
    let service = module.service().clone();
    let loader = FixturesLoader::new();

    for (_, fixture) in loader.load_all(PACK, "policytypes").unwrap() {
        let api = PolicyTypeApi::from_value(fixture).unwrap();
        service.register_policy_type(&api).unwrap();
    }
    if with_policies {
        for (_, fixture) in loader.load_all(PACK, "policies").unwrap() {
            let api = PolicyApi::from_value(fixture).unwrap();
            service.create_policy(&api).unwrap();
        }
    }

    let router = Router::new().nest("/v1", module.routes());
    Harness { router, service, _dir: dir }
}
