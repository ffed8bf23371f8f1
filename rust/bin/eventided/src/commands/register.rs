//! `eventided register`: load content packs into the store.

use std::path::Path;

use policy::{PolicyModule, PolicyRegistrar};
use tracing::info;

use crate::config::Config;
use crate::db;

pub fn run(config: &Config, packs: Option<&Path>, fail_on_failure: bool) -> anyhow::Result<()> {
    let base = packs.unwrap_or(config.content.packs_base_path.as_path());
    let store = db::setup(&config.database)?;
    let module = PolicyModule::new(store.clone());

    let result = PolicyRegistrar::new(module.service().clone())
        .fail_on_failure(fail_on_failure)
        .register_from_packs(base);
    db::teardown(&store);

    let summary = result?;
    info!(
        "Registered {} policy type(s) and {} policy(ies) from {} ({} failed)",
        summary.policy_types,
        summary.policies,
        base.display(),
        summary.failed
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_fixture_packs() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.database.data_dir = dir.path().to_path_buf();

        run(&config, Some(eventide_testing::fixtures_dir().as_path()), true).unwrap();

        let store = db::setup(&config.database).unwrap();
        let module = PolicyModule::new(store.clone());
        let svc = module.service();
        assert_eq!(svc.list_policy_types().unwrap().len(), 2);
        assert_eq!(svc.list_policies().unwrap().len(), 3);
        db::teardown(&store);
    }
}
