//! Opening and closing the embedded store.

use std::sync::Arc;

use anyhow::Context;
use eventide_kv::RedbStore;
use tracing::{info, warn};

use crate::config::DatabaseConfig;

pub fn setup(config: &DatabaseConfig) -> anyhow::Result<Arc<RedbStore>> {
    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("create data dir {}", config.data_dir.display()))?;
    let path = config.db_path();
    let store = RedbStore::open(&path)
        .map_err(|e| anyhow::anyhow!("failed to open KV store {}: {}", path.display(), e))?;
    info!("Connected to database {}", path.display());
    Ok(Arc::new(store))
}

/// Close the store. Requests still holding it get `KVError::Closed`.
pub fn teardown(store: &RedbStore) {
    if store.is_closed() {
        return;
    }
    match store.close() {
        Ok(()) => info!("Disconnected from database {}", store.path().display()),
        Err(e) => warn!("Closing database {} failed: {}", store.path().display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventide_kv::KVStore;

    #[test]
    fn setup_creates_data_dir_and_teardown_closes() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            data_dir: dir.path().join("nested/data"),
            db_name: "test".into(),
        };
        let store = setup(&config).unwrap();
        assert!(config.db_path().exists());

        store.set("k", b"v").unwrap();
        teardown(&store);
        assert!(store.is_closed());
        assert!(store.get("k").is_err());

        // Idempotent.
        teardown(&store);
    }
}
