//! Drift between content on disk and what is registered in the store.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::loader::ContentLoader;
use crate::model::{PolicyApi, PolicyDb, PolicyTypeApi, PolicyTypeDb};
use crate::registrar::{
    resource_err, with_default_pack, RegistrarError, POLICIES_DIR, POLICY_TYPES_DIR,
};
use crate::service::PolicyService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftKind {
    OnlyOnDisk,
    OnlyInDb,
    Differs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drift {
    /// `policytypes` or `policies`.
    pub resource: &'static str,
    /// Policy type name or policy ref.
    pub key: String,
    pub kind: DriftKind,
}

impl fmt::Display for Drift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DriftKind::OnlyOnDisk => write!(f, "{} {} in disk not available in db.", self.resource, self.key),
            DriftKind::OnlyInDb => write!(f, "{} {} in db not available in disk.", self.resource, self.key),
            DriftKind::Differs => write!(f, "{} {} differs between disk and db.", self.resource, self.key),
        }
    }
}

#[derive(Debug, Default)]
pub struct DiffReport {
    pub drifts: Vec<Drift>,
}

impl DiffReport {
    pub fn is_clean(&self) -> bool {
        self.drifts.is_empty()
    }
}

/// Compare every pack under `base` against the store. Records are compared
/// in their stored form with ids cleared.
pub fn diff_packs(service: &PolicyService, base: &Path) -> Result<DiffReport, RegistrarError> {
    let packs = ContentLoader::packs(base)?;

    let mut disk_types = BTreeMap::new();
    let mut disk_policies = BTreeMap::new();
    for (pack, pack_dir) in &packs {
        for path in ContentLoader::resources(pack_dir, POLICY_TYPES_DIR)? {
            let value = ContentLoader::load(&path)?;
            let mut model = PolicyTypeApi::from_value(value)
                .map(|api| api.to_model())
                .map_err(|e| resource_err(&path, e))?;
            model.id.clear();
            disk_types.insert(model.name.clone(), model);
        }
        for path in ContentLoader::resources(pack_dir, POLICIES_DIR)? {
            let value = with_default_pack(ContentLoader::load(&path)?, pack);
            let mut model = PolicyApi::from_value(value)
                .and_then(|api| api.to_model())
                .map_err(|e| resource_err(&path, e))?;
            model.id.clear();
            disk_policies.insert(model.reference.clone(), model);
        }
    }

    let db_types: BTreeMap<String, PolicyTypeDb> = service
        .list_policy_types()
        .map_err(|e| resource_err(base, e))?
        .into_iter()
        .map(|mut m| {
            m.id.clear();
            (m.name.clone(), m)
        })
        .collect();
    let db_policies: BTreeMap<String, PolicyDb> = service
        .list_policies()
        .map_err(|e| resource_err(base, e))?
        .into_iter()
        .map(|mut m| {
            m.id.clear();
            (m.reference.clone(), m)
        })
        .collect();

    let mut report = DiffReport::default();
    compare(POLICY_TYPES_DIR, &disk_types, &db_types, &mut report);
    compare(POLICIES_DIR, &disk_policies, &db_policies, &mut report);
    Ok(report)
}

fn compare<T: PartialEq>(
    resource: &'static str,
    disk: &BTreeMap<String, T>,
    db: &BTreeMap<String, T>,
    report: &mut DiffReport,
) {
    for (key, on_disk) in disk {
        let kind = match db.get(key) {
            None => DriftKind::OnlyOnDisk,
            Some(in_db) if in_db != on_disk => DriftKind::Differs,
            Some(_) => continue,
        };
        report.drifts.push(Drift { resource, key: key.clone(), kind });
    }
    for key in db.keys().filter(|k| !disk.contains_key(*k)) {
        report.drifts.push(Drift {
            resource,
            key: key.clone(),
            kind: DriftKind::OnlyInDb,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registrar::PolicyRegistrar;
    use serde_json::json;
    use std::fs;

    fn write(base: &Path, rel: &str, body: &str) {
        let path = base.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    #[test]
    fn reports_each_kind_of_drift() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "core/policytypes/concurrency.json",
            &json!({
                "name": "action.concurrency",
                "resource_type": "action",
                "module": "eventide.policies.concurrency",
                "parameters": {"threshold": {"type": "integer"}}
            })
            .to_string(),
        );
        write(
            dir.path(),
            "core/policies/a.yaml",
            "name: a\nresource_ref: core.x\npolicy_type: action.concurrency\nparameters:\n  threshold: 1\n",
        );

        let (kv, _db) = eventide_testing::temp_kv();
        let svc = PolicyService::new(kv);
        PolicyRegistrar::new(svc.clone()).register_from_packs(dir.path()).unwrap();
        assert!(diff_packs(&svc, dir.path()).unwrap().is_clean());

        // Changed on disk, added on disk, and removed from disk.
        write(
            dir.path(),
            "core/policies/a.yaml",
            "name: a\nresource_ref: core.x\npolicy_type: action.concurrency\nparameters:\n  threshold: 2\n",
        );
        write(
            dir.path(),
            "core/policies/b.yaml",
            "name: b\nresource_ref: core.y\npolicy_type: action.concurrency\n",
        );
        fs::remove_file(dir.path().join("core/policytypes/concurrency.json")).unwrap();

        let report = diff_packs(&svc, dir.path()).unwrap();
        let seen: Vec<(String, DriftKind)> =
            report.drifts.iter().map(|d| (d.key.clone(), d.kind)).collect();
        assert_eq!(
            seen,
            vec![
                ("action.concurrency".to_string(), DriftKind::OnlyInDb),
                ("core.a".to_string(), DriftKind::Differs),
                ("core.b".to_string(), DriftKind::OnlyOnDisk),
            ]
        );
        assert_eq!(
            report.drifts[2].to_string(),
            "policies core.b in disk not available in db."
        );
    }

    #[test]
    fn ids_in_content_files_do_not_count_as_drift() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "core/policytypes/concurrency.yaml",
            "id: 5f0c\nname: action.concurrency\nresource_type: action\nmodule: m\nparameters:\n  threshold:\n    type: integer\n",
        );
        write(
            dir.path(),
            "core/policies/a.yaml",
            "id: 7a1d\nname: a\nresource_ref: core.x\npolicy_type: action.concurrency\nparameters:\n  threshold: 1\n",
        );

        let (kv, _db) = eventide_testing::temp_kv();
        let svc = PolicyService::new(kv);
        PolicyRegistrar::new(svc.clone()).register_from_packs(dir.path()).unwrap();
        let report = diff_packs(&svc, dir.path()).unwrap();
        assert!(report.is_clean(), "{:?}", report.drifts);
    }
}
