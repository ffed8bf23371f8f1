//! The `Document` trait: what a persistence model declares about itself.

use eventide_core::ServiceError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A unique constraint instance: the constraint name, the fields it covers
/// and this document's values for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueKey {
    pub name: &'static str,
    pub fields: &'static [&'static str],
    pub values: Vec<String>,
}

impl UniqueKey {
    pub fn new(name: &'static str, fields: &'static [&'static str], values: Vec<String>) -> Self {
        Self { name, fields, values }
    }

    /// `pack="core", name="local"`: used in conflict messages.
    pub fn describe(&self) -> String {
        self.fields
            .iter()
            .zip(&self.values)
            .map(|(f, v)| format!("{}=\"{}\"", f, v))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Implemented by persistence models stored through [`crate::Access`].
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection name, also the KV key namespace.
    const COLLECTION: &'static str;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);

    /// Unique constraints this document participates in.
    fn unique_keys(&self) -> Vec<UniqueKey> {
        Vec::new()
    }

    /// Field-level checks run before every write.
    fn validate(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}

/// Reject empty values for required string fields.
pub fn require_fields(collection: &str, fields: &[(&str, &str)]) -> Result<(), ServiceError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::Validation(format!(
            "{}: required field(s) missing: {}",
            collection,
            missing.join(", ")
        )))
    }
}
