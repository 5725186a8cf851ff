use std::{ffi::OsString, marker::PhantomData, path::PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tokio::fs;
use tracing::{debug, warn};

use crate::errors::ServiceError;
use crate::metrics;

/// Single JSON document persisted in one file.
///
/// Nothing is cached: every `load` re-reads the file and every `save`
/// rewrites it whole. Saves go through a sibling `*.tmp` file and a rename,
/// so a reader sees either the old or the new document.
#[derive(Debug, Clone)]
pub struct JsonDocumentStore<T> {
    file_path: PathBuf,
    _doc: PhantomData<fn() -> T>,
}

impl<T> JsonDocumentStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { file_path: path.into(), _doc: PhantomData }
    }

    /// Read and decode the document, reporting absence or corruption.
    pub async fn try_load(&self) -> Result<T, ServiceError> {
        let bytes = fs::read(&self.file_path)
            .await
            .map_err(|e| ServiceError::StorageUnreadable(format!("{}: {e}", self.file_path.display())))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ServiceError::StorageUnreadable(format!("{}: {e}", self.file_path.display())))
    }

    /// Read the document; an absent or unreadable file yields `T::default()`.
    pub async fn load(&self) -> T {
        match self.try_load().await {
            Ok(doc) => doc,
            Err(e) => {
                if fs::try_exists(&self.file_path).await.unwrap_or(false) {
                    metrics::STORAGE_UNREADABLE_TOTAL.inc();
                    warn!(path = %self.file_path.display(), error = %e, "document unreadable; using empty document");
                } else {
                    debug!(path = %self.file_path.display(), "document absent; using empty document");
                }
                T::default()
            }
        }
    }

    /// Replace the document on disk.
    pub async fn save(&self, doc: &T) -> Result<(), ServiceError> {
        if let Some(parent) = self.file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(ServiceError::storage)?;
        }
        let data = serde_json::to_vec_pretty(doc).map_err(ServiceError::storage)?;
        let tmp = self.tmp_path();
        fs::write(&tmp, data).await.map_err(ServiceError::storage)?;
        fs::rename(&tmp, &self.file_path).await.map_err(ServiceError::storage)?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name: OsString = self.file_path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}
