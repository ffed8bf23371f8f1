//! Test support shared by the module crates: YAML fixtures, throwaway KV
//! stores and an HTTP helper for driving routers in-process.

pub mod fixtures;
pub mod http;

use std::sync::Arc;

use eventide_kv::{KVStore, RedbStore};

pub use fixtures::{fixtures_dir, FixtureError, FixturesLoader};
pub use http::{call, call_with, TestResponse};

/// A redb-backed store in a fresh temporary directory. Keep the `TempDir`
/// alive for as long as the store is used.
pub fn temp_kv() -> (Arc<dyn KVStore>, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let store = RedbStore::open(&dir.path().join("test.redb")).expect("open redb");
    (Arc::new(store), dir)
}
