use std::path::{Path, PathBuf};
use std::sync::RwLock;

use redb::{Database, ReadableTable, TableDefinition};
use tracing::debug;

use crate::error::KVError;
use crate::traits::KVStore;

const TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("kv");

/// RedbStore is a KVStore implementation backed by redb: a pure-Rust embedded
/// key-value database.
///
/// The database handle lives until [`RedbStore::close`] is called; every
/// operation after that fails with [`KVError::Closed`].
pub struct RedbStore {
    db: RwLock<Option<Database>>,
    path: PathBuf,
}

fn storage<E: std::fmt::Display>(e: E) -> KVError {
    KVError::Storage(e.to_string())
}

impl RedbStore {
    /// Open or create a redb database at the given path.
    pub fn open(path: &Path) -> Result<Self, KVError> {
        let db = Database::create(path).map_err(storage)?;

        // Ensure the table exists by doing a write transaction.
        let write_txn = db.begin_write().map_err(storage)?;
        {
            let _table = write_txn.open_table(TABLE).map_err(storage)?;
        }
        write_txn.commit().map_err(storage)?;

        debug!("RedbStore: opened {:?}", path);
        Ok(Self {
            db: RwLock::new(Some(db)),
            path: path.to_path_buf(),
        })
    }

    /// Path of the underlying database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the database. Idempotent.
    pub fn close(&self) -> Result<(), KVError> {
        let mut guard = self.db.write().map_err(storage)?;
        if guard.take().is_some() {
            debug!("RedbStore: closed {:?}", self.path);
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.db.read().map(|g| g.is_none()).unwrap_or(true)
    }

    fn with_db<R>(&self, f: impl FnOnce(&Database) -> Result<R, KVError>) -> Result<R, KVError> {
        let guard = self.db.read().map_err(storage)?;
        match guard.as_ref() {
            Some(db) => f(db),
            None => Err(KVError::Closed),
        }
    }
}

impl KVStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError> {
        self.with_db(|db| {
            let read_txn = db.begin_read().map_err(storage)?;
            let table = read_txn.open_table(TABLE).map_err(storage)?;
            let value = table.get(key).map_err(storage)?;
            Ok(value.map(|v| v.value().to_vec()))
        })
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError> {
        self.batch_write(&[(key, value)], &[])
    }

    fn delete(&self, key: &str) -> Result<(), KVError> {
        self.batch_write(&[], &[key])
    }

    fn batch_write(&self, sets: &[(&str, &[u8])], deletes: &[&str]) -> Result<(), KVError> {
        self.with_db(|db| {
            let write_txn = db.begin_write().map_err(storage)?;
            {
                let mut table = write_txn.open_table(TABLE).map_err(storage)?;
                for key in deletes {
                    table.remove(*key).map_err(storage)?;
                }
                for (key, value) in sets {
                    table.insert(*key, *value).map_err(storage)?;
                }
            }
            write_txn.commit().map_err(storage)?;
            Ok(())
        })
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError> {
        self.with_db(|db| {
            let read_txn = db.begin_read().map_err(storage)?;
            let table = read_txn.open_table(TABLE).map_err(storage)?;

            let mut results = Vec::new();
            for entry in table.range(prefix..).map_err(storage)? {
                let (key, value) = entry.map_err(storage)?;
                let key = key.value().to_string();
                if !key.starts_with(prefix) {
                    break;
                }
                results.push((key, value.value().to_vec()));
            }
            Ok(results)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp() -> (RedbStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(&dir.path().join("test.redb")).unwrap();
        (store, dir)
    }

    #[test]
    fn set_get_delete() {
        let (store, _dir) = open_temp();
        store.set("policy:doc:1", b"one").unwrap();
        assert_eq!(store.get("policy:doc:1").unwrap(), Some(b"one".to_vec()));

        store.delete("policy:doc:1").unwrap();
        assert_eq!(store.get("policy:doc:1").unwrap(), None);

        // Deleting a missing key is fine.
        store.delete("policy:doc:1").unwrap();
    }

    #[test]
    fn scan_stops_at_prefix_boundary() {
        let (store, _dir) = open_temp();
        store.set("policy:doc:a", b"a").unwrap();
        store.set("policy:doc:b", b"b").unwrap();
        store.set("policy:idx:x", b"x").unwrap();
        store.set("policytype:doc:c", b"c").unwrap();

        let entries = store.scan("policy:doc:").unwrap();
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["policy:doc:a", "policy:doc:b"]);
    }

    #[test]
    fn batch_write_sets_and_deletes_together() {
        let (store, _dir) = open_temp();
        store.set("old", b"1").unwrap();

        store
            .batch_write(&[("new", b"2".as_slice()), ("other", b"3".as_slice())], &["old"])
            .unwrap();

        assert_eq!(store.get("old").unwrap(), None);
        assert_eq!(store.get("new").unwrap(), Some(b"2".to_vec()));
        assert_eq!(store.get("other").unwrap(), Some(b"3".to_vec()));
    }

    #[test]
    fn closed_store_rejects_operations() {
        let (store, _dir) = open_temp();
        store.set("k", b"v").unwrap();
        store.close().unwrap();
        assert!(store.is_closed());
        assert!(matches!(store.get("k"), Err(KVError::Closed)));
        // Second close is a no-op.
        store.close().unwrap();
    }

    #[test]
    fn reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("persist.redb");
        {
            let store = RedbStore::open(&path).unwrap();
            store.set("token:doc:abc", b"{}").unwrap();
            store.close().unwrap();
        }
        let store = RedbStore::open(&path).unwrap();
        assert_eq!(store.get("token:doc:abc").unwrap(), Some(b"{}".to_vec()));
    }
}
