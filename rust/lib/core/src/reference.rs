//! Namespaced resource references (`pack.name`).

use std::fmt;

use crate::ServiceError;

/// Separator between the pack and the name in a reference.
pub const SEPARATOR: &str = ".";

/// Pack used when content does not name one.
pub const DEFAULT_PACK_NAME: &str = "default";

/// A reference to a content-pack resource, e.g. `core.local.concurrency`.
///
/// The pack is everything before the first separator; the name is the rest
/// and may itself contain separators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceReference {
    pub pack: String,
    pub name: String,
    pub r#ref: String,
}

impl ResourceReference {
    pub fn new(pack: &str, name: &str) -> Result<Self, ServiceError> {
        let r#ref = Self::to_string_reference(pack, name)?;
        Ok(Self {
            pack: pack.to_string(),
            name: name.to_string(),
            r#ref,
        })
    }

    /// References always contain a separator; ids never do.
    pub fn is_resource_reference(value: &str) -> bool {
        value.contains(SEPARATOR)
    }

    /// Build the string form of a reference. Both parts must be non-empty.
    pub fn to_string_reference(pack: &str, name: &str) -> Result<String, ServiceError> {
        if pack.is_empty() || name.is_empty() {
            return Err(ServiceError::Validation(format!(
                "Both pack and name needed for building ref. name={}, pack={}",
                name, pack
            )));
        }
        Ok(format!("{}{}{}", pack, SEPARATOR, name))
    }

    /// Parse `pack.name`.
    pub fn from_string_reference(value: &str) -> Result<Self, ServiceError> {
        match value.split_once(SEPARATOR) {
            Some((pack, name)) if !pack.is_empty() && !name.is_empty() => Self::new(pack, name),
            _ => Err(ServiceError::Validation(format!(
                "{} is not a valid reference.",
                value
            ))),
        }
    }
}

impl fmt::Display for ResourceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.r#ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_and_parse() {
        let r = ResourceReference::new("core", "local.concurrency").unwrap();
        assert_eq!(r.r#ref, "core.local.concurrency");

        let parsed = ResourceReference::from_string_reference("core.local.concurrency").unwrap();
        assert_eq!(parsed.pack, "core");
        assert_eq!(parsed.name, "local.concurrency");
        assert_eq!(parsed, r);
    }

    #[test]
    fn rejects_missing_parts() {
        assert!(ResourceReference::to_string_reference("", "x").is_err());
        assert!(ResourceReference::to_string_reference("core", "").is_err());
        assert!(ResourceReference::from_string_reference("nodot").is_err());
        assert!(ResourceReference::from_string_reference(".name").is_err());
        assert!(ResourceReference::from_string_reference("pack.").is_err());
    }

    #[test]
    fn detects_references() {
        assert!(ResourceReference::is_resource_reference("core.local"));
        assert!(!ResourceReference::is_resource_reference("5f2b0c9e1a"));
    }
}
