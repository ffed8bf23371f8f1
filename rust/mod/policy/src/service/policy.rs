use eventide_core::{schema, ServiceError};
use eventide_store::Query;
use serde_json::Value;
use tracing::{debug, info};

use crate::model::{PolicyApi, PolicyDb};
use crate::service::PolicyService;

impl PolicyService {
    pub fn get_policy(&self, ref_or_id: &str) -> Result<PolicyDb, ServiceError> {
        self.policies.lookup(ref_or_id)
    }

    pub fn get_policy_by_ref(&self, pack: &str, name: &str) -> Result<Option<PolicyDb>, ServiceError> {
        self.policies
            .access()
            .query_one(&Query::new().filter("pack", pack).filter("name", name))
    }

    pub fn list_policies(&self) -> Result<Vec<PolicyDb>, ServiceError> {
        self.policies.access().all()
    }

    /// The policy type must exist and the parameters must satisfy its
    /// parameter schema.
    pub fn check_policy(&self, policy: &PolicyDb) -> Result<(), ServiceError> {
        let policy_type = self
            .get_policy_type_by_name(&policy.policy_type)?
            .ok_or_else(|| {
                ServiceError::Validation(format!(
                    "Policy type \"{}\" does not exist.",
                    policy.policy_type
                ))
            })?;

        schema::validate(
            &format!("Parameters of policy \"{}\"", policy.reference),
            &policy_type.parameters_schema(),
            &Value::Object(policy.parameters.clone()),
        )
    }

    /// Store a new policy. A client-supplied id is ignored.
    pub fn create_policy(&self, api: &PolicyApi) -> Result<PolicyDb, ServiceError> {
        let mut model = api.to_model()?;
        model.id = String::new();
        self.check_policy(&model)?;

        let saved = self.policies.access().add_or_update(model)?;
        info!("policy {} created with id {}", saved.reference, saved.id);
        Ok(saved)
    }

    /// Replace the policy identified by `ref_or_id`, keeping its id.
    pub fn update_policy(&self, ref_or_id: &str, api: &PolicyApi) -> Result<PolicyDb, ServiceError> {
        let existing = self.get_policy(ref_or_id)?;
        let mut model = api.to_model()?;
        model.id = existing.id;
        self.check_policy(&model)?;

        let saved = self.policies.access().add_or_update(model)?;
        info!("policy {} updated", saved.reference);
        Ok(saved)
    }

    pub fn delete_policy(&self, ref_or_id: &str) -> Result<PolicyDb, ServiceError> {
        let existing = self.get_policy(ref_or_id)?;
        let deleted = self.policies.access().delete(&existing.id)?;
        info!("policy {} deleted", deleted.reference);
        Ok(deleted)
    }

    /// Insert a policy, or update the one with the same ref in place.
    pub fn register_policy(&self, api: &PolicyApi) -> Result<(PolicyDb, bool), ServiceError> {
        let mut model = api.to_model()?;
        let existing = self.get_policy_by_ref(&model.pack, &model.name)?;
        let created = existing.is_none();
        model.id = existing.map(|e| e.id).unwrap_or_default();
        self.check_policy(&model)?;

        let saved = self.policies.access().add_or_update(model)?;
        debug!(
            "policy {} {}",
            saved.reference,
            if created { "created" } else { "updated" }
        );
        Ok((saved, created))
    }
}
