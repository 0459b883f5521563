use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};

use crate::dao::{kv_store::KeyValueStore, storage::StorageResult};

use super::{
    config::{CouchConfig, CouchCredentials},
    error::{CouchDaoError, CouchResult},
    models::{CouchRevision, CouchValueDocument},
};

/// Writes racing on the same document are retried this many times.
const MAX_PUT_ATTEMPTS: u32 = 2;

/// Key-value store keeping each blob in its own CouchDB document.
#[derive(Clone)]
pub struct CouchKeyValueStore {
    client: Client,
    database_url: Arc<str>,
    database: Arc<str>,
    credentials: Option<Arc<CouchCredentials>>,
}

impl CouchKeyValueStore {
    /// Connect to CouchDB, creating the database when it does not exist yet.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let store = Self {
            client,
            database_url: Arc::from(format!(
                "{}/{}",
                config.base_url.trim_end_matches('/'),
                config.database
            )),
            database: Arc::from(config.database),
            credentials: config.credentials.map(Arc::new),
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn authorized(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, url);
        match self.credentials.as_deref() {
            Some(credentials) => {
                builder.basic_auth(&credentials.username, Some(&credentials.password))
            }
            None => builder,
        }
    }

    fn request(&self, method: Method, doc_id: &str) -> reqwest::RequestBuilder {
        self.authorized(method, &format!("{}/{}", self.database_url, doc_id))
    }

    fn database_request(&self, method: Method) -> reqwest::RequestBuilder {
        self.authorized(method, &self.database_url)
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let response = self
            .database_request(Method::GET)
            .send()
            .await
            .map_err(|source| CouchDaoError::DatabaseQuery {
                database: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .database_request(Method::PUT)
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::DatabaseCreate {
                        database: database.clone(),
                        source,
                    })?;
                if create.status().is_success() {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, doc_id)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json::<T>().await.map(Some).map_err(|source| {
                    CouchDaoError::DecodeResponse {
                        path: doc_id.to_string(),
                        source,
                    }
                })
            }
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    /// Write a document, reporting a revision conflict as `Ok(false)`.
    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<bool>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::PUT, doc_id)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::CONFLICT => Ok(false),
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    /// Replace the value under `doc_id`, refetching the revision once after a conflict.
    async fn upsert_value(&self, doc_id: &str, value: String) -> CouchResult<()> {
        let mut attempts = 0;
        loop {
            let rev = self
                .get_document::<CouchRevision>(doc_id)
                .await?
                .map(|existing| existing.rev);
            let doc = CouchValueDocument {
                id: doc_id.to_string(),
                rev,
                value: value.clone(),
            };
            if self.put_document(doc_id, &doc).await? {
                return Ok(());
            }

            attempts += 1;
            if attempts >= MAX_PUT_ATTEMPTS {
                return Err(CouchDaoError::RequestStatus {
                    path: doc_id.to_string(),
                    status: StatusCode::CONFLICT,
                });
            }
        }
    }

    async fn delete_document(&self, doc_id: &str, rev: &str) -> CouchResult<()> {
        let response = self
            .request(Method::DELETE, doc_id)
            .query(&[("rev", rev)])
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            status if status.is_success() => Ok(()),
            // Someone else removed it in the meantime.
            StatusCode::NOT_FOUND => Ok(()),
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }
}

impl KeyValueStore for CouchKeyValueStore {
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let store = self.clone();
        let doc_id = key.to_string();
        Box::pin(async move {
            let maybe_doc = store.get_document::<CouchValueDocument>(&doc_id).await?;
            Ok(maybe_doc.map(|doc| doc.value))
        })
    }

    fn put(&self, key: &str, value: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let doc_id = key.to_string();
        Box::pin(async move { store.upsert_value(&doc_id, value).await.map_err(Into::into) })
    }

    fn remove(&self, key: &str) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        let doc_id = key.to_string();
        Box::pin(async move {
            let Some(existing) = store.get_document::<CouchRevision>(&doc_id).await? else {
                return Ok(false);
            };
            store.delete_document(&doc_id, &existing.rev).await?;
            Ok(true)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let url = store.database_url.to_string();
            let response = store
                .database_request(Method::GET)
                .send()
                .await
                .map_err(|source| CouchDaoError::RequestSend {
                    path: url.clone(),
                    source,
                })?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::RequestStatus {
                    path: url,
                    status: response.status(),
                }
                .into())
            }
        })
    }
}
