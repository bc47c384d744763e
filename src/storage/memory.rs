// src/storage/memory.rs

//! In-memory seen-store implementation.
//!
//! No durability. Used by tests and available wherever persistence is
//! explicitly not wanted.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::SeenEntry;
use crate::storage::SeenStore;

/// Seen store backed by a process-local map.
#[derive(Debug, Default)]
pub struct MemorySeenStore {
    entries: Mutex<HashMap<String, BTreeMap<String, DateTime<Utc>>>>,
}

impl MemorySeenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SeenStore for MemorySeenStore {
    async fn has_seen(&self, match_name: &str, identity: &str) -> Result<bool> {
        let entries = self.entries.lock().unwrap();
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
        let mut entries = self.entries.lock().unwrap();
        entries
            .entry(match_name.to_string())
            .or_default()
            .entry(identity.to_string())
            .or_insert(first_seen);
        Ok(())
    }

    async fn entries(&self, match_name: &str) -> Result<Vec<SeenEntry>> {
        let entries = self.entries.lock().unwrap();

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
        let entries = self.entries.lock().unwrap();
        let mut names: Vec<String> = entries
            .iter()
            .filter(|(_, m)| !m.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mark_and_has_seen() {
        let store = MemorySeenStore::new();
        assert!(!store.has_seen("m", "id").await.unwrap());
        store.mark_seen("m", "id", Utc::now()).await.unwrap();
        assert!(store.has_seen("m", "id").await.unwrap());
    }

    #[tokio::test]
    async fn test_idempotent_keeps_first_timestamp() {
        let store = MemorySeenStore::new();
        let first = Utc::now();
        store.mark_seen("m", "id", first).await.unwrap();
        store
            .mark_seen("m", "id", first + chrono::Duration::days(1))
            .await
            .unwrap();

        let entries = store.entries("m").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].first_seen, first);
    }
}
