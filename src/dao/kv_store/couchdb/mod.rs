mod config;
mod error;
mod models;
mod store;

pub use config::{CouchConfig, CouchCredentials, DEFAULT_DATABASE};
pub use error::{CouchDaoError, CouchResult};
pub use store::CouchKeyValueStore;
