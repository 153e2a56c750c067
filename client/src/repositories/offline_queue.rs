//! Offline queue persistence
//!
//! The queue is stored as a JSON array of [`OfflineQueueEntry`] under a
//! single fixed key.

use super::storage::LocalStorage;
use anyhow::{Context, Result};
use garden_assistant_shared::OfflineQueueEntry;
use std::sync::Arc;
use tracing::warn;

/// Offline queue repository
#[derive(Clone)]
pub struct OfflineQueueRepository {
    storage: Arc<dyn LocalStorage>,
    key: String,
}

impl OfflineQueueRepository {
    pub fn new(storage: Arc<dyn LocalStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read all persisted entries in enqueue order
    pub async fn load(&self) -> Result<Vec<OfflineQueueEntry>> {
        let raw = self
            .storage
            .get_item(&self.key)
            .await
            .context("reading offline queue")?;
        parse_entries(raw.as_deref())
    }

    /// Append one entry at the end of the persisted list
    ///
    /// A persisted list that no longer decodes is discarded and replaced
    /// by the new entry alone.
    pub async fn append(&self, entry: OfflineQueueEntry) -> Result<usize> {
        let raw = self
            .storage
            .get_item(&self.key)
            .await
            .context("reading offline queue")?;
        let mut entries = parse_entries(raw.as_deref()).unwrap_or_else(|e| {
            warn!(key = %self.key, error = %format!("{:#}", e), "Discarding corrupted offline queue");
            metrics::counter!("garden_storage_failures_total").increment(1);
            Vec::new()
        });
        entries.push(entry);
        self.save(&entries).await?;
        Ok(entries.len())
    }

    /// Read the persisted list and clear it before returning
    ///
    /// Storage is emptied before the entries are decoded, so an entry is
    /// never handed out twice even if decoding or replay fails.
    pub async fn take_all(&self) -> Result<Vec<OfflineQueueEntry>> {
        let raw = self
            .storage
            .get_item(&self.key)
            .await
            .context("reading offline queue")?;
        if raw.is_none() {
            return Ok(Vec::new());
        }
        self.save(&[]).await?;
        parse_entries(raw.as_deref())
    }

    /// Replace the persisted list
    pub async fn save(&self, entries: &[OfflineQueueEntry]) -> Result<()> {
        let json = serde_json::to_string(entries).context("encoding offline queue")?;
        self.storage
            .set_item(&self.key, &json)
            .await
            .context("writing offline queue")?;
        Ok(())
    }
}

fn parse_entries(raw: Option<&str>) -> Result<Vec<OfflineQueueEntry>> {
    match raw {
        None => Ok(Vec::new()),
        Some(raw) if raw.trim().is_empty() => Ok(Vec::new()),
        Some(raw) => serde_json::from_str(raw).context("decoding offline queue"),
    }
}
