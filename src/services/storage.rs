//! Local filesystem storage listing

use crate::services::{ObjectEntry, ServiceError, StorageListingService};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::debug;

/// Lists files under a local directory (or a `file://` URL)
#[derive(Debug, Clone, Default)]
pub struct LocalStorage;

impl LocalStorage {
    pub fn new() -> Self {
        Self
    }

    fn resolve(prefix: &str) -> Result<PathBuf, ServiceError> {
        if let Some(path) = prefix.strip_prefix("file://") {
            return Ok(PathBuf::from(path));
        }
        if prefix.contains("://") {
            return Err(ServiceError::Unsupported(format!(
                "no storage backend for {}",
                prefix
            )));
        }
        Ok(PathBuf::from(prefix))
    }
}

#[async_trait]
impl StorageListingService for LocalStorage {
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectEntry>, ServiceError> {
        let root = Self::resolve(prefix)?;
        let mut objects = Vec::new();

        if !tokio::fs::try_exists(&root).await? {
            debug!(prefix = %prefix, "Prefix does not exist yet");
            return Ok(objects);
        }

        let mut pending = vec![root];
        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let metadata = entry.metadata().await?;
                if metadata.is_dir() {
                    pending.push(entry.path());
                } else if metadata.is_file() {
                    objects.push(ObjectEntry {
                        key: entry.path().display().to_string(),
                        last_modified: DateTime::<Utc>::from(metadata.modified()?),
                    });
                }
            }
        }

        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }
}
