/// Key-value backends holding the persisted blobs.
pub mod kv_store;
/// Schema migrations for persisted blobs.
pub mod migrations;
/// Persisted data model definitions.
pub mod models;
/// Chat-completion client used for question generation.
pub mod openai;
/// Versioned persistence adapter.
pub mod persistence;
/// Storage error types shared by the backends.
pub mod storage;
