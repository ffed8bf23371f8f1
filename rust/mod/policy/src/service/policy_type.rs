use eventide_core::ServiceError;
use eventide_store::Query;
use tracing::debug;

use crate::model::{PolicyTypeApi, PolicyTypeDb};
use crate::service::PolicyService;

impl PolicyService {
    pub fn get_policy_type(&self, id: &str) -> Result<PolicyTypeDb, ServiceError> {
        self.policy_types.access().get(id)
    }

    pub fn get_policy_type_by_name(&self, name: &str) -> Result<Option<PolicyTypeDb>, ServiceError> {
        self.policy_types.access().get_by_name(name)
    }

    pub fn list_policy_types(&self) -> Result<Vec<PolicyTypeDb>, ServiceError> {
        self.policy_types.access().all()
    }

    pub fn list_policy_types_by_resource_type(
        &self,
        resource_type: &str,
    ) -> Result<Vec<PolicyTypeDb>, ServiceError> {
        let query = Query::new().filter("resource_type", resource_type);
        Ok(self.policy_types.access().query(&query)?.items)
    }

    /// Insert a policy type, or update the one with the same name in place.
    /// Returns the stored record and whether it was newly created.
    pub fn register_policy_type(
        &self,
        api: &PolicyTypeApi,
    ) -> Result<(PolicyTypeDb, bool), ServiceError> {
        let mut model = api.to_model();
        let existing = self.get_policy_type_by_name(&model.name)?;
        let created = existing.is_none();
        model.id = existing.map(|e| e.id).unwrap_or_default();

        let saved = self.policy_types.access().add_or_update(model)?;
        debug!(
            "policy type {} {}",
            saved.name,
            if created { "created" } else { "updated" }
        );
        Ok((saved, created))
    }
}
