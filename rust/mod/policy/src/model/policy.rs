use eventide_core::{schema, ResourceReference, ServiceError, DEFAULT_PACK_NAME};
use eventide_store::{require_fields, Document, UniqueKey};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::default_enabled;

/// A policy type applied to one resource, as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDb {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub pack: String,
    /// Always `pack.name`.
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub resource_ref: String,
    /// Name of the governing [`super::PolicyTypeDb`].
    pub policy_type: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl PolicyDb {
    pub fn get_reference(&self) -> Result<ResourceReference, ServiceError> {
        ResourceReference::new(&self.pack, &self.name)
    }
}

impl Document for PolicyDb {
    const COLLECTION: &'static str = "policy";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![
            UniqueKey::new("pack_name", &["pack", "name"], vec![self.pack.clone(), self.name.clone()]),
            UniqueKey::new(
                "resource_ref_policy_type",
                &["resource_ref", "policy_type"],
                vec![self.resource_ref.clone(), self.policy_type.clone()],
            ),
        ]
    }

    fn validate(&self) -> Result<(), ServiceError> {
        require_fields(
            Self::COLLECTION,
            &[
                ("name", &self.name),
                ("pack", &self.pack),
                ("ref", &self.reference),
                ("resource_ref", &self.resource_ref),
                ("policy_type", &self.policy_type),
            ],
        )?;
        let expected = self.get_reference()?;
        if expected.r#ref != self.reference {
            return Err(ServiceError::Validation(format!(
                "policy ref \"{}\" does not match pack and name (expected \"{}\")",
                self.reference, expected
            )));
        }
        Ok(())
    }
}

/// Wire representation of a policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyApi {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pack: Option<String>,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub resource_ref: String,
    pub policy_type: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl PolicyApi {
    pub fn schema() -> Value {
        json!({
            "title": "Policy",
            "type": "object",
            "properties": {
                "id": {"type": "string"},
                "name": {"type": "string"},
                "pack": {"type": "string"},
                "ref": {"type": "string"},
                "description": {"type": "string"},
                "enabled": {"type": "boolean", "default": true},
                "resource_ref": {"type": "string"},
                "policy_type": {"type": "string"},
                "parameters": {
                    "type": "object",
                    "patternProperties": {
                        "^\\w+$": {
                            "anyOf": [
                                {"type": "array"},
                                {"type": "boolean"},
                                {"type": "integer"},
                                {"type": "number"},
                                {"type": "object"},
                                {"type": "string"}
                            ]
                        }
                    }
                }
            },
            "required": ["name", "resource_ref", "policy_type"],
            "additionalProperties": false
        })
    }

    pub fn from_value(value: Value) -> Result<Self, ServiceError> {
        schema::validate("Policy", &Self::schema(), &value)?;
        serde_json::from_value(value).map_err(|e| ServiceError::Validation(format!("Policy: {}", e)))
    }

    /// Convert to the stored form. `ref` is recomputed from pack and name;
    /// a missing pack becomes the default pack.
    pub fn to_model(&self) -> Result<PolicyDb, ServiceError> {
        let pack = match self.pack.as_deref() {
            Some(pack) if !pack.is_empty() => pack.to_string(),
            _ => DEFAULT_PACK_NAME.to_string(),
        };
        let reference = ResourceReference::to_string_reference(&pack, &self.name)?;
        Ok(PolicyDb {
            id: self.id.clone().unwrap_or_default(),
            name: self.name.clone(),
            pack,
            reference,
            description: self.description.clone(),
            enabled: self.enabled,
            resource_ref: self.resource_ref.clone(),
            policy_type: self.policy_type.clone(),
            parameters: self.parameters.clone(),
        })
    }

    pub fn from_model(model: &PolicyDb) -> Self {
        Self {
            id: Some(model.id.clone()),
            name: model.name.clone(),
            pack: Some(model.pack.clone()),
            reference: Some(model.reference.clone()),
            description: model.description.clone(),
            enabled: model.enabled,
            resource_ref: model.resource_ref.clone(),
            policy_type: model.policy_type.clone(),
            parameters: model.parameters.clone(),
        }
    }
}
