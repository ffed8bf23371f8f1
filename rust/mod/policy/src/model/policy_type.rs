use eventide_core::{schema, ServiceError};
use eventide_store::{require_fields, Document, UniqueKey};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::default_enabled;

/// A class of policy (e.g. concurrency limiting) as stored.
///
/// `parameters` maps each parameter name to the JSON schema its values must
/// satisfy. A spec may carry `required: true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyTypeDb {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Kind of resource policies of this type apply to.
    pub resource_type: String,
    /// Locator of the implementation enforcing this type.
    pub module: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl PolicyTypeDb {
    /// Object schema the `parameters` of a policy of this type must match.
    pub fn parameters_schema(&self) -> Value {
        schema::parameters_schema(&self.parameters)
    }
}

impl Document for PolicyTypeDb {
    const COLLECTION: &'static str = "policytype";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::new("name", &["name"], vec![self.name.clone()])]
    }

    fn validate(&self) -> Result<(), ServiceError> {
        require_fields(
            Self::COLLECTION,
            &[
                ("name", &self.name),
                ("resource_type", &self.resource_type),
                ("module", &self.module),
            ],
        )
    }
}

/// Wire representation of a policy type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyTypeApi {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub resource_type: String,
    pub module: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl PolicyTypeApi {
    pub fn schema() -> Value {
        json!({
            "title": "Policy Type",
            "type": "object",
            "properties": {
                "id": {"type": "string"},
                "name": {"type": "string"},
                "description": {"type": "string"},
                "enabled": {"type": "boolean", "default": true},
                "resource_type": {"type": "string"},
                "module": {"type": "string"},
                "parameters": {
                    "type": "object",
                    "patternProperties": {
                        "^\\w+$": {"type": "object"}
                    }
                }
            },
            "required": ["name", "resource_type", "module"],
            "additionalProperties": false
        })
    }

    /// Validate a raw payload and decode it. Each parameter spec must be a
    /// usable schema in its own right.
    pub fn from_value(value: Value) -> Result<Self, ServiceError> {
        schema::validate("Policy Type", &Self::schema(), &value)?;
        let api: Self = serde_json::from_value(value)
            .map_err(|e| ServiceError::Validation(format!("Policy Type: {}", e)))?;
        for (name, spec) in &api.parameters {
            schema::check_schema(name, spec)?;
        }
        Ok(api)
    }

    pub fn to_model(&self) -> PolicyTypeDb {
        PolicyTypeDb {
            id: self.id.clone().unwrap_or_default(),
            name: self.name.clone(),
            description: self.description.clone(),
            enabled: self.enabled,
            resource_type: self.resource_type.clone(),
            module: self.module.clone(),
            parameters: self.parameters.clone(),
        }
    }

    pub fn from_model(model: &PolicyTypeDb) -> Self {
        Self {
            id: Some(model.id.clone()),
            name: model.name.clone(),
            description: model.description.clone(),
            enabled: model.enabled,
            resource_type: model.resource_type.clone(),
            module: model.module.clone(),
            parameters: model.parameters.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concurrency() -> Value {
        json!({
            "name": "action.concurrency",
            "description": "Limits the concurrent executions for the action.",
            "resource_type": "action",
            "module": "eventide.policies.concurrency",
            "parameters": {
                "threshold": {"type": "integer", "required": true}
            }
        })
    }

    #[test]
    fn decode_and_convert() {
        let api = PolicyTypeApi::from_value(concurrency()).unwrap();
        assert!(api.enabled);

        let model = api.to_model();
        assert_eq!(model.id, "");
        assert_eq!(model.name, "action.concurrency");
        assert_eq!(model.resource_type, "action");
        assert_eq!(
            model.parameters_schema()["required"],
            json!(["threshold"])
        );
    }

    #[test]
    fn missing_required_field() {
        let mut value = concurrency();
        value.as_object_mut().unwrap().remove("module");
        let err = PolicyTypeApi::from_value(value).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(err.to_string().contains("module"));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let mut value = concurrency();
        value["color"] = json!("red");
        assert!(matches!(
            PolicyTypeApi::from_value(value),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn wrong_type_is_rejected() {
        let mut value = concurrency();
        value["enabled"] = json!("yes");
        assert!(PolicyTypeApi::from_value(value).is_err());
    }

    #[test]
    fn invalid_parameter_spec_is_rejected() {
        let mut value = concurrency();
        value["parameters"]["threshold"] = json!({"type": "no-such-type"});
        let err = PolicyTypeApi::from_value(value).unwrap_err();
        assert!(err.to_string().contains("threshold"));

    }

    #[test]
    fn parameter_names_outside_the_word_pattern_are_allowed() {
        let mut value = concurrency();
        value["parameters"]["retry-on"] = json!({"type": "string"});
        let api = PolicyTypeApi::from_value(value).unwrap();
        assert!(api.parameters.contains_key("retry-on"));
    }

    #[test]
    fn model_validation_rejects_blank_fields() {
        let mut model = PolicyTypeApi::from_value(concurrency()).unwrap().to_model();
        model.resource_type = " ".into();
        assert!(model.validate().is_err());
    }
}
