// src/storage/mod.rs

//! Seen-listing store: the persistent record of which listings have
//! already triggered a notification for which match.
//!
//! Entries are keyed on `(match_name, identity)`. The same identity under
//! two different match names is two distinct entries. Entries are never
//! updated and never expire; a stale entry only suppresses re-notification,
//! it can never cause a wrong notification.

pub mod local;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{Listing, SeenEntry};

// Re-export for convenience
pub use local::LocalSeenStore;
pub use memory::MemorySeenStore;

/// Trait for seen-listing store backends.
#[async_trait]
pub trait SeenStore: Send + Sync {
    /// Whether this listing identity has already been notified for a match.
    async fn has_seen(&self, match_name: &str, identity: &str) -> Result<bool>;

    /// Record a notified listing identity. Idempotent: marking an
    /// already-seen identity keeps the original `first_seen` timestamp.
    async fn mark_seen(
        &self,
        match_name: &str,
        identity: &str,
        first_seen: DateTime<Utc>,
    ) -> Result<()>;

    /// All entries recorded for a match, ordered by `first_seen`.
    async fn entries(&self, match_name: &str) -> Result<Vec<SeenEntry>>;

    /// Distinct match names with at least one entry, sorted.
    async fn match_names(&self) -> Result<Vec<String>>;

    /// Split listings into (never seen, already seen), preserving input
    /// order within each half. Read-only: committing is the caller's
    /// decision, after a notification is judged delivered.
    async fn partition_new(
        &self,
        match_name: &str,
        listings: &[Listing],
    ) -> Result<(Vec<Listing>, Vec<Listing>)> {
        let mut fresh = Vec::new();
        let mut seen = Vec::new();
        for listing in listings {
            if self.has_seen(match_name, &listing.identity()).await? {
                seen.push(listing.clone());
            } else {
                fresh.push(listing.clone());
            }
        }
        Ok((fresh, seen))
    }
}
