use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::future::BoxFuture;
use tokio::fs;
use uuid::Uuid;

use crate::dao::{
    kv_store::KeyValueStore,
    storage::{StorageError, StorageResult},
};

/// Store keeping one JSON file per key inside a directory.
#[derive(Clone)]
pub struct FileStore {
    root: Arc<PathBuf>,
}

impl FileStore {
    /// Open the store, creating the directory when missing.
    pub async fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|source| {
            StorageError::unavailable(
                format!("failed to create storage directory `{}`", root.display()),
                source,
            )
        })?;

        Ok(Self {
            root: Arc::new(root),
        })
    }

    /// Directory holding the stored files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name = key
            .chars()
            .map(|c| match c {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => c,
                _ => '_',
            })
            .collect::<String>();
        self.root.join(format!("{file_name}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let path = self.path_for(key);
        Box::pin(async move {
            match fs::read_to_string(&path).await {
                Ok(contents) => Ok(Some(contents)),
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
                Err(err) => Err(StorageError::unavailable(
                    format!("failed to read `{}`", path.display()),
                    err,
                )),
            }
        })
    }

    fn put(&self, key: &str, value: String) -> BoxFuture<'static, StorageResult<()>> {
        let path = self.path_for(key);
        Box::pin(async move {
            // Each write stages its own file next to the target, then renames it in place.
            let staging = path.with_extension(format!("json.{}.tmp", Uuid::new_v4().simple()));
            fs::write(&staging, value.as_bytes())
                .await
                .map_err(|err| {
                    StorageError::unavailable(format!("failed to write `{}`", staging.display()), err)
                })?;
            fs::rename(&staging, &path).await.map_err(|err| {
                StorageError::unavailable(format!("failed to replace `{}`", path.display()), err)
            })
        })
    }

    fn remove(&self, key: &str) -> BoxFuture<'static, StorageResult<bool>> {
        let path = self.path_for(key);
        Box::pin(async move {
            match fs::remove_file(&path).await {
                Ok(()) => Ok(true),
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
                Err(err) => Err(StorageError::unavailable(
                    format!("failed to remove `{}`", path.display()),
                    err,
                )),
            }
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let root = self.root.clone();
        Box::pin(async move {
            let metadata = fs::metadata(root.as_path()).await.map_err(|err| {
                StorageError::unavailable(
                    format!("storage directory `{}` unreachable", root.display()),
                    err,
                )
            })?;
            if metadata.is_dir() {
                Ok(())
            } else {
                Err(StorageError::unavailable(
                    format!("`{}` is not a directory", root.display()),
                    std::io::Error::from(ErrorKind::NotADirectory),
                ))
            }
        })
    }
}
