//! Environment/runtime helpers
//!
//! Sanity checks and first-run preparation of the registry data file.

use std::path::Path;

use tracing::{info, warn};

/// Outcome of [`ensure_data_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFileInit {
    /// The data file was already present; nothing was written.
    Existing,
    /// The data file was created from the seed document.
    Seeded,
    /// The data file was created with the given empty document.
    Empty,
}

/// Make sure `data_file` exists, creating parent directories as needed.
///
/// A missing data file is populated from `seed_file` when one is given and
/// readable, otherwise with `empty_document`.
pub async fn ensure_data_file(
    data_file: &Path,
    seed_file: Option<&Path>,
    empty_document: &[u8],
) -> anyhow::Result<DataFileInit> {
    if let Some(parent) = data_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", parent.display()))?;
    }

    if tokio::fs::try_exists(data_file).await.unwrap_or(false) {
        return Ok(DataFileInit::Existing);
    }

    if let Some(seed) = seed_file {
        match tokio::fs::read(seed).await {
            Ok(bytes) => {
                tokio::fs::write(data_file, bytes).await?;
                info!(seed = %seed.display(), data = %data_file.display(), "data file seeded");
                return Ok(DataFileInit::Seeded);
            }
            Err(e) => {
                warn!(seed = %seed.display(), error = %e, "seed file unreadable; starting empty");
            }
        }
    }

    tokio::fs::write(data_file, empty_document).await?;
    info!(data = %data_file.display(), "empty data file created");
    Ok(DataFileInit::Empty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn tmp_dir() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("common_env_{}", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn creates_empty_file_without_seed() -> anyhow::Result<()> {
        let dir = tmp_dir();
        let data = dir.join("nested/data.json");
        let init = ensure_data_file(&data, None, b"{}").await?;
        assert_eq!(init, DataFileInit::Empty);
        assert_eq!(tokio::fs::read(&data).await?, b"{}");
        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn copies_seed_and_leaves_existing_alone() -> anyhow::Result<()> {
        let dir = tmp_dir();
        tokio::fs::create_dir_all(&dir).await?;
        let seed = dir.join("seed.json");
        let data = dir.join("data.json");
        tokio::fs::write(&seed, b"seeded").await?;

        assert_eq!(ensure_data_file(&data, Some(&seed), b"{}").await?, DataFileInit::Seeded);
        tokio::fs::write(&seed, b"changed").await?;
        assert_eq!(ensure_data_file(&data, Some(&seed), b"{}").await?, DataFileInit::Existing);
        assert_eq!(tokio::fs::read(&data).await?, b"seeded");

        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn unreadable_seed_falls_back_to_empty() -> anyhow::Result<()> {
        let dir = tmp_dir();
        let data = dir.join("data.json");
        let missing = dir.join("missing-seed.json");
        assert_eq!(ensure_data_file(&data, Some(&missing), b"{}").await?, DataFileInit::Empty);
        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }
}
