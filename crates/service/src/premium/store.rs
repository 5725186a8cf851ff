use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use models::RegistryDocument;

use crate::errors::ServiceError;
use crate::storage::json_document_store::JsonDocumentStore;

/// Trait abstraction for registry persistence.
///
/// `load` never fails: a missing or corrupt document reads as an empty registry.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    async fn load(&self) -> RegistryDocument;
    async fn save(&self, doc: &RegistryDocument) -> Result<(), ServiceError>;
}

/// Registry persisted as `{"premium_users": [...]}` in a single JSON file.
#[derive(Clone)]
pub struct FileRegistryStore {
    store: JsonDocumentStore<RegistryDocument>,
}

impl FileRegistryStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Arc<Self> {
        Arc::new(Self { store: JsonDocumentStore::new(path) })
    }
}

#[async_trait]
impl RegistryStore for FileRegistryStore {
    async fn load(&self) -> RegistryDocument { self.store.load().await }
    async fn save(&self, doc: &RegistryDocument) -> Result<(), ServiceError> { self.store.save(doc).await }
}
