//! JSON-schema helpers shared by the API models.
//!
//! API payloads are validated against Draft 7 schemas. Parameter specs
//! written by content authors may also use the older per-property form
//! `{"type": "integer", "required": true}`; [`parameters_schema`] lifts those
//! flags into the enclosing object's `required` list before compiling.

use jsonschema::{Draft, JSONSchema};
use serde_json::{Map, Value};

use crate::ServiceError;

fn compile(schema: &Value) -> Result<JSONSchema, String> {
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(schema)
        .map_err(|e| e.to_string())
}

/// Validate `instance` against `schema`. All violations are reported in one
/// `ServiceError::Validation`, prefixed with `title`.
pub fn validate(title: &str, schema: &Value, instance: &Value) -> Result<(), ServiceError> {
    let compiled = compile(schema)
        .map_err(|e| ServiceError::Internal(format!("{} schema does not compile: {}", title, e)))?;

    if let Err(errors) = compiled.validate(instance) {
        let messages: Vec<String> = errors
            .map(|err| {
                let path = err.instance_path.to_string();
                if path.is_empty() {
                    err.to_string()
                } else {
                    format!("{}: {}", path, err)
                }
            })
            .collect();
        return Err(ServiceError::Validation(format!(
            "{} validation failed: {}",
            title,
            messages.join("; ")
        )));
    }
    Ok(())
}

/// Remove a boolean `required` flag from a single property spec.
fn strip_required_flag(spec: &Value) -> (Value, bool) {
    match spec {
        Value::Object(map) => {
            let mut map = map.clone();
            let required = match map.get("required") {
                Some(Value::Bool(flag)) => {
                    let flag = *flag;
                    map.remove("required");
                    flag
                }
                _ => false,
            };
            (Value::Object(map), required)
        }
        other => (other.clone(), false),
    }
}

/// Check that a parameter spec is itself a usable JSON schema.
pub fn check_schema(name: &str, spec: &Value) -> Result<(), ServiceError> {
    let (spec, _) = strip_required_flag(spec);
    compile(&spec).map(|_| ()).map_err(|e| {
        ServiceError::Validation(format!("parameter '{}' is not a valid schema: {}", name, e))
    })
}

/// Build an object schema out of a map of parameter specs. Only declared
/// parameters are allowed; specs flagged `required: true` become required.
pub fn parameters_schema(specs: &Map<String, Value>) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for (name, spec) in specs {
        let (spec, is_required) = strip_required_flag(spec);
        if is_required {
            required.push(Value::String(name.clone()));
        }
        properties.insert(name.clone(), spec);
    }

    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("object".into()));
    schema.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".into(), Value::Array(required));
    }
    schema.insert("additionalProperties".into(), Value::Bool(false));
    Value::Object(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validate_reports_every_violation() {
        let schema = json!({
            "type": "object",
            "properties": {"name": {"type": "string"}},
            "required": ["name"],
            "additionalProperties": false
        });
        assert!(validate("Thing", &schema, &json!({"name": "x"})).is_ok());

        let err = validate("Thing", &schema, &json!({"extra": 1})).unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("Thing validation failed"));
        assert!(msg.contains("name"));
        assert!(msg.contains("extra"));
    }

    #[test]
    fn check_schema_accepts_required_flag() {
        assert!(check_schema("threshold", &json!({"type": "integer", "required": true})).is_ok());
        assert!(check_schema("threshold", &json!({"type": "no-such-type"})).is_err());
    }

    #[test]
    fn parameters_schema_lifts_required() {
        let specs = json!({
            "threshold": {"type": "integer", "required": true},
            "action": {"type": "string", "enum": ["delay", "cancel"]}
        });
        let schema = parameters_schema(specs.as_object().unwrap());

        assert!(validate("Params", &schema, &json!({"threshold": 3})).is_ok());
        assert!(validate("Params", &schema, &json!({"threshold": 3, "action": "delay"})).is_ok());
        // Missing required.
        assert!(validate("Params", &schema, &json!({"action": "delay"})).is_err());
        // Wrong type.
        assert!(validate("Params", &schema, &json!({"threshold": "many"})).is_err());
        // Undeclared parameter.
        assert!(validate("Params", &schema, &json!({"threshold": 1, "other": 2})).is_err());
    }
}
