//! On-disk snapshot of the last scraped batch.
//!
//! The file is a JSON array of [`ScrapedItem`]s in extraction order. It lets
//! views be populated at startup without scraping again.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

use crate::domain::ScrapedItem;

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot. A missing or unreadable file yields an empty batch.
    pub async fn load(&self) -> Vec<ScrapedItem> {
        let json = match fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!("Could not read snapshot {:?}: {}", self.path, e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<ScrapedItem>>(&json) {
            Ok(items) => {
                info!("Loaded {} items from snapshot {:?}", items.len(), self.path);
                items
            }
            Err(e) => {
                warn!("Ignoring corrupt snapshot {:?}: {}", self.path, e);
                Vec::new()
            }
        }
    }

    pub async fn save(&self, items: &[ScrapedItem]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create snapshot directory {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(items)?;
        fs::write(&self.path, json)
            .await
            .with_context(|| format!("Failed to write snapshot {}", self.path.display()))?;

        info!("Saved {} items to snapshot {:?}", items.len(), self.path);
        Ok(())
    }
}
