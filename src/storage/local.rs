// src/storage/local.rs

//! Local filesystem seen-store implementation.
//!
//! One JSON file holding `match_name -> identity -> first_seen`, loaded
//! fully at open and rewritten atomically (write to temp, then rename)
//! whenever a new entry is recorded. A single monitoring process is the
//! only writer; an interior mutex serializes concurrent match cycles.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::SeenEntry;
use crate::storage::SeenStore;

type SeenMap = HashMap<String, BTreeMap<String, DateTime<Utc>>>;

/// On-disk file layout.
#[derive(Debug, Serialize, Deserialize, Default)]
struct SeenFile {
    /// Timestamp of the last write
    updated_at: Option<DateTime<Utc>>,
    /// match name -> listing identity -> first seen
    matches: SeenMap,
}

/// Seen store backed by a single local JSON file.
pub struct LocalSeenStore {
    path: PathBuf,
    entries: Mutex<SeenMap>,
}

impl LocalSeenStore {
    /// Open the store, loading existing entries if the file is present.
    ///
    /// A missing file yields an empty store (losing it only risks
    /// duplicate notifications). A corrupt file is an error: silently
    /// starting fresh would re-alert every known listing.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let file: SeenFile = serde_json::from_slice(&bytes).map_err(|e| {
                    AppError::store(format!("corrupt seen file {}: {}", path.display(), e))
                })?;
                file.matches
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No seen file at {}, starting empty", path.display());
                SeenMap::default()
            }
            Err(e) => return Err(AppError::Io(e)),
        };

        let total: usize = entries.values().map(|m| m.len()).sum();
        log::debug!(
            "Seen store loaded: {} entries across {} matches",
            total,
            entries.len()
        );

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Write the full map atomically.
    async fn persist(&self, entries: &SeenMap) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let file = SeenFile {
            updated_at: Some(Utc::now()),
            matches: entries.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&file)?;

        let tmp = self.path.with_extension("tmp");
        let mut out = tokio::fs::File::create(&tmp).await?;
        out.write_all(&bytes).await?;
        out.flush().await?;
        drop(out);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl SeenStore for LocalSeenStore {
    async fn has_seen(&self, match_name: &str, identity: &str) -> Result<bool> {
        let entries = self.entries.lock().await;
        Ok(entries
            .get(match_name)
            .is_some_and(|m| m.contains_key(identity)))
    }

    async fn mark_seen(
        &self,
        match_name: &str,
        identity: &str,
        first_seen: DateTime<Utc>,
    ) -> Result<()> {
        let mut entries = self.entries.lock().await;

        let per_match = entries.entry(match_name.to_string()).or_default();
        if per_match.contains_key(identity) {
            // Idempotent: the original first_seen stands
            return Ok(());
        }
        per_match.insert(identity.to_string(), first_seen);

        self.persist(&entries).await
    }

    async fn entries(&self, match_name: &str) -> Result<Vec<SeenEntry>> {
        let entries = self.entries.lock().await;

        let mut result: Vec<SeenEntry> = entries
            .get(match_name)
            .map(|per_match| {
                per_match
                    .iter()
                    .map(|(identity, first_seen)| SeenEntry {
                        match_name: match_name.to_string(),
                        identity: identity.clone(),
                        first_seen: *first_seen,
                    })
                    .collect()
            })
            .unwrap_or_default();

        result.sort_by_key(|e| e.first_seen);
        Ok(result)
    }

    async fn match_names(&self) -> Result<Vec<String>> {
        let entries = self.entries.lock().await;
        let mut names: Vec<String> = entries
            .iter()
            .filter(|(_, m)| !m.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        Ok(names)
    }
}
