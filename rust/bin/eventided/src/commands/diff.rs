//! `eventided diff`: compare content packs on disk with the store.

use std::path::Path;

use policy::{diff_packs, PolicyModule};
use tracing::info;

use crate::config::Config;
use crate::db;

/// `Ok(true)` when disk and store agree.
pub fn run(config: &Config, packs: Option<&Path>) -> anyhow::Result<bool> {
    let base = packs.unwrap_or(config.content.packs_base_path.as_path());
    let store = db::setup(&config.database)?;
    let module = PolicyModule::new(store.clone());
    let result = diff_packs(module.service(), base);
    db::teardown(&store);

    let report = result?;
    for drift in &report.drifts {
        println!("{}", drift);
    }
    if report.is_clean() {
        info!("No differences between {} and the database", base.display());
    }
    Ok(report.is_clean())
}
