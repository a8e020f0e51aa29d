use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::info;

use crate::storage::{object_key, ResumeStore};

/// Stores résumés under a directory on local disk. Locations are paths
/// relative to that root.
pub struct LocalResumeStore {
    root: PathBuf,
}

impl LocalResumeStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, location: &str) -> Result<PathBuf> {
        let relative = Path::new(location);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if location.is_empty() || escapes {
            bail!("invalid storage location '{location}'");
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ResumeStore for LocalResumeStore {
    async fn put(&self, bytes: Bytes, owner_key: &str, file_name: &str) -> Result<String> {
        let location = object_key(owner_key, file_name);
        let path = self.resolve(&location)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(&path, &bytes)
            .await
            .with_context(|| format!("writing {}", path.display()))?;

        info!("Stored {} bytes at {}", bytes.len(), path.display());
        Ok(location)
    }

    async fn get(&self, location: &str) -> Result<Bytes> {
        let path = self.resolve(location)?;
        let data = fs::read(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        Ok(Bytes::from(data))
    }

    async fn delete(&self, location: &str) -> Result<()> {
        let path = self.resolve(location)?;
        fs::remove_file(&path)
            .await
            .with_context(|| format!("removing {}", path.display()))
    }
}
