/// CouchDB backend.
#[cfg(feature = "couch-store")]
pub mod couchdb;
/// One JSON file per key in a directory.
pub mod file;
/// In-process map, optionally quota bound.
pub mod memory;

use futures::future::BoxFuture;

use crate::dao::storage::StorageResult;

/// Abstraction over the medium holding the persisted blobs.
///
/// Values are opaque strings; versioning and JSON handling live in
/// [`crate::dao::persistence`].
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>>;
    fn put(&self, key: &str, value: String) -> BoxFuture<'static, StorageResult<()>>;
    /// Remove a key, returning whether it existed.
    fn remove(&self, key: &str) -> BoxFuture<'static, StorageResult<bool>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
