use crate::error::KVError;

/// KVStore provides the key-value interface the document layer is built on.
///
/// Keys follow a namespaced convention: `policy:doc:{id}`,
/// `policy:idx:pack_name:core\x1flocal.concurrency`, etc.
pub trait KVStore: Send + Sync {
    /// Get the value for a key. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError>;

    /// Set a key-value pair.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError>;

    /// Delete a key. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), KVError>;

    /// Apply a set of writes and deletes atomically: either every entry is
    /// committed or none is.
    fn batch_write(&self, sets: &[(&str, &[u8])], deletes: &[&str]) -> Result<(), KVError>;

    /// Scan all keys matching a prefix. Returns (key, value) pairs sorted by key.
    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError>;
}
