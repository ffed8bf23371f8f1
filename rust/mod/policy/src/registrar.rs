use std::path::Path;
use std::sync::Arc;

use eventide_core::ServiceError;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::loader::{ContentLoader, LoaderError};
use crate::model::{PolicyApi, PolicyTypeApi};
use crate::service::PolicyService;

pub const POLICY_TYPES_DIR: &str = "policytypes";
pub const POLICIES_DIR: &str = "policies";

#[derive(Debug, Error)]
pub enum RegistrarError {
    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error("{path}: {source}")]
    Resource { path: String, source: ServiceError },
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RegisterSummary {
    pub policy_types: usize,
    pub policies: usize,
    pub failed: usize,
}

/// Registers policy types and policies found in content packs.
///
/// Policy types of every pack go in before any policy, so a policy may
/// reference a type shipped by another pack.
pub struct PolicyRegistrar {
    service: Arc<PolicyService>,
    fail_on_failure: bool,
}

impl PolicyRegistrar {
    pub fn new(service: Arc<PolicyService>) -> Self {
        Self { service, fail_on_failure: false }
    }

    /// Abort on the first invalid file instead of logging and skipping it.
    pub fn fail_on_failure(mut self, fail: bool) -> Self {
        self.fail_on_failure = fail;
        self
    }

    pub fn register_from_packs(&self, base: &Path) -> Result<RegisterSummary, RegistrarError> {
        let packs = ContentLoader::packs(base)?;
        let mut summary = RegisterSummary::default();

        for (pack, pack_dir) in &packs {
            for path in ContentLoader::resources(pack_dir, POLICY_TYPES_DIR)? {
                let outcome = ContentLoader::load(&path)
                    .map_err(RegistrarError::from)
                    .and_then(|v| self.register_policy_type(v).map_err(|e| resource_err(&path, e)));
                self.tally(outcome, &path, pack, &mut summary.policy_types, &mut summary.failed)?;
            }
        }

        for (pack, pack_dir) in &packs {
            for path in ContentLoader::resources(pack_dir, POLICIES_DIR)? {
                let outcome = ContentLoader::load(&path)
                    .map_err(RegistrarError::from)
                    .and_then(|v| self.register_policy(pack, v).map_err(|e| resource_err(&path, e)));
                self.tally(outcome, &path, pack, &mut summary.policies, &mut summary.failed)?;
            }
        }

        info!(
            "Registered {} policy type(s) and {} policy(ies) from {} pack(s); {} failed",
            summary.policy_types,
            summary.policies,
            packs.len(),
            summary.failed
        );
        Ok(summary)
    }

    fn register_policy_type(&self, value: Value) -> Result<(), ServiceError> {
        let api = PolicyTypeApi::from_value(value)?;
        self.service.register_policy_type(&api)?;
        Ok(())
    }

    fn register_policy(&self, pack: &str, value: Value) -> Result<(), ServiceError> {
        let api = PolicyApi::from_value(with_default_pack(value, pack))?;
        self.service.register_policy(&api)?;
        Ok(())
    }

    fn tally(
        &self,
        outcome: Result<(), RegistrarError>,
        path: &Path,
        pack: &str,
        registered: &mut usize,
        failed: &mut usize,
    ) -> Result<(), RegistrarError> {
        match outcome {
            Ok(()) => {
                *registered += 1;
                Ok(())
            }
            Err(e) if self.fail_on_failure => Err(e),
            Err(e) => {
                warn!("Failed to register {:?} from pack {}: {}", path, pack, e);
                *failed += 1;
                Ok(())
            }
        }
    }
}

/// Content files may leave out `pack`; it then comes from the directory.
pub(crate) fn with_default_pack(mut value: Value, pack: &str) -> Value {
    if let Value::Object(map) = &mut value {
        let missing = match map.get("pack") {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        };
        if missing {
            map.insert("pack".into(), Value::String(pack.to_string()));
        }
    }
    value
}

pub(crate) fn resource_err(path: &Path, source: ServiceError) -> RegistrarError {
    RegistrarError::Resource {
        path: path.display().to_string(),
        source,
    }
}
