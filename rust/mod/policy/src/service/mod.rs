pub mod policy;
pub mod policy_type;

use std::sync::Arc;

use eventide_kv::KVStore;
use eventide_store::{Access, Resource, ResourceController};

use crate::model::{PolicyApi, PolicyDb, PolicyTypeApi, PolicyTypeDb};

/// `/policytypes`: read-only, looked up by id.
pub struct PolicyTypeResource;

impl Resource for PolicyTypeResource {
    type Db = PolicyTypeDb;
    type Api = PolicyTypeApi;

    const PATH: &'static str = "/policytypes";
    const SUPPORTED_FILTERS: &'static [(&'static str, &'static str)] = &[
        ("id", "id"),
        ("name", "name"),
        ("resource_type", "resource_type"),
    ];
    const DEFAULT_SORT: &'static [&'static str] = &["resource_type", "name"];

    fn from_model(model: &PolicyTypeDb) -> PolicyTypeApi {
        PolicyTypeApi::from_model(model)
    }
}

/// `/policies`: content-pack resource, looked up by id or `pack.name`.
pub struct PolicyResource;

impl Resource for PolicyResource {
    type Db = PolicyDb;
    type Api = PolicyApi;

    const PATH: &'static str = "/policies";
    const SUPPORTED_FILTERS: &'static [(&'static str, &'static str)] = &[
        ("id", "id"),
        ("name", "name"),
        ("pack", "pack"),
        ("ref", "ref"),
        ("resource_ref", "resource_ref"),
        ("policy_type", "policy_type"),
    ];
    const DEFAULT_SORT: &'static [&'static str] = &["pack", "name"];
    const CONTENT_PACK: bool = true;

    fn from_model(model: &PolicyDb) -> PolicyApi {
        PolicyApi::from_model(model)
    }
}

/// Policy types and policies over one KV store.
pub struct PolicyService {
    pub(crate) policy_types: Arc<ResourceController<PolicyTypeResource>>,
    pub(crate) policies: Arc<ResourceController<PolicyResource>>,
}

impl PolicyService {
    pub fn new(kv: Arc<dyn KVStore>) -> Arc<Self> {
        let policy_types = Arc::new(Access::<PolicyTypeDb>::new(kv.clone()));
        let policies = Arc::new(Access::<PolicyDb>::new(kv));
        Arc::new(Self {
            policy_types: Arc::new(ResourceController::new(policy_types)),
            policies: Arc::new(ResourceController::new(policies)),
        })
    }

    pub fn policy_types_controller(&self) -> Arc<ResourceController<PolicyTypeResource>> {
        self.policy_types.clone()
    }

    pub fn policies_controller(&self) -> Arc<ResourceController<PolicyResource>> {
        self.policies.clone()
    }
}
