//! Runtime environment helpers
//!
//! Wires configuration into a ready-to-use `RegistryService`, preparing the
//! data file on first start.

use std::{path::Path, sync::Arc};

use configs::RegistryConfig;
use models::RegistryDocument;
use tracing::info;

use crate::auth::SharedSecret;
use crate::premium::{FileRegistryStore, RegistryService};

/// Create the data file (from the seed document if configured) when absent.
pub async fn ensure_env(cfg: &RegistryConfig) -> anyhow::Result<()> {
    let empty = serde_json::to_vec_pretty(&RegistryDocument::default())?;
    let outcome = common::env::ensure_data_file(
        Path::new(&cfg.data_file),
        cfg.seed_file.as_deref().map(Path::new),
        &empty,
    )
    .await?;
    info!(data_file = %cfg.data_file, ?outcome, "registry storage ready");
    Ok(())
}

/// Prepare storage and build the file-backed registry service.
pub async fn build_registry(cfg: &RegistryConfig) -> anyhow::Result<Arc<RegistryService>> {
    ensure_env(cfg).await?;
    let store = FileRegistryStore::new(&cfg.data_file);
    Ok(Arc::new(RegistryService::new(store, SharedSecret::new(cfg.api_key.clone()))))
}
