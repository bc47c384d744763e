// src/pipeline/cycle.rs

//! Per-match check cycle.
//!
//! One cycle runs scrape → filter → dedup → notify for a single match and
//! reduces every outcome, including failures, to a [`CycleReport`]. No
//! error escapes [`CycleRunner::run`]; the scheduler only ever sees
//! reports, so one match can never take down a pass.

use std::fmt;

use chrono::Utc;

use crate::models::MatchConfig;
use crate::notify::{AlertListing, AlertPayload, Dispatcher, delivered};
use crate::pipeline::filter_listings;
use crate::services::{ListingSource, ScrapeOutcome};
use crate::storage::SeenStore;

/// Stage of a check cycle, used to attribute failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStage {
    Scraping,
    Filtering,
    Deduping,
    Notifying,
}

impl fmt::Display for CycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Scraping => "scraping",
            Self::Filtering => "filtering",
            Self::Deduping => "deduping",
            Self::Notifying => "notifying",
        };
        f.write_str(name)
    }
}

/// Terminal state of one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed,
    Failed { stage: CycleStage, reason: String },
}

/// Summary of one match's cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub match_name: String,
    /// Raw listings scraped from the event page
    pub scraped: usize,
    /// Listings satisfying the match criteria
    pub qualifying: usize,
    /// Qualifying listings never notified before
    pub fresh: usize,
    /// Qualifying listings already notified in an earlier cycle
    pub seen_again: usize,
    /// Whether at least one channel delivered (or none was needed)
    pub notified: bool,
    pub outcome: CycleOutcome,
}

impl CycleReport {
    fn new(match_name: &str) -> Self {
        Self {
            match_name: match_name.to_string(),
            scraped: 0,
            qualifying: 0,
            fresh: 0,
            seen_again: 0,
            notified: false,
            outcome: CycleOutcome::Completed,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, CycleOutcome::Failed { .. })
    }

    fn fail(mut self, stage: CycleStage, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        log::error!(
            "Cycle failed for {} during {}: {}",
            self.match_name,
            stage,
            reason
        );
        self.outcome = CycleOutcome::Failed { stage, reason };
        self
    }

    fn complete(self) -> Self {
        log::info!(
            "Cycle complete for {}: {} scraped, {} qualifying, {} new, {} seen again, notified: {}",
            self.match_name,
            self.scraped,
            self.qualifying,
            self.fresh,
            self.seen_again,
            self.notified
        );
        self
    }
}

/// Runs check cycles for individual matches.
pub struct CycleRunner<'a> {
    source: &'a dyn ListingSource,
    store: &'a dyn SeenStore,
    dispatcher: &'a Dispatcher,
}

impl<'a> CycleRunner<'a> {
    pub fn new(
        source: &'a dyn ListingSource,
        store: &'a dyn SeenStore,
        dispatcher: &'a Dispatcher,
    ) -> Self {
        Self {
            source,
            store,
            dispatcher,
        }
    }

    /// Run one full cycle for a match. Infallible: every failure mode is
    /// captured in the returned report.
    pub async fn run(&self, config: &MatchConfig) -> CycleReport {
        let mut report = CycleReport::new(&config.name);
        log::info!("Checking tickets for {}", config.name);

        // Scraping
        let listings = match self.source.fetch(config).await {
            Ok(ScrapeOutcome::Listings(listings)) => listings,
            Ok(ScrapeOutcome::PageNotFound) => {
                // Benign: the event may not be listed yet
                log::info!("No event page for {} yet", config.name);
                return report.complete();
            }
            Err(e) => return report.fail(CycleStage::Scraping, e.to_string()),
        };
        report.scraped = listings.len();

        // Filtering (pure, cannot fail)
        let qualifying = filter_listings(&listings, config);
        report.qualifying = qualifying.len();

        // Deduping: read-only split; committing waits for delivery
        let (fresh, seen) = match self.store.partition_new(&config.name, &qualifying).await {
            Ok(parts) => parts,
            Err(e) => return report.fail(CycleStage::Deduping, e.to_string()),
        };
        report.fresh = fresh.len();
        report.seen_again = seen.len();

        let mut alerts: Vec<AlertListing> = fresh
            .iter()
            .map(|listing| AlertListing {
                listing: listing.clone(),
                seen_again: false,
            })
            .collect();
        if config.notify_seen_tickets {
            alerts.extend(seen.iter().map(|listing| AlertListing {
                listing: listing.clone(),
                seen_again: true,
            }));
        }

        if alerts.is_empty() {
            log::info!("No listings to notify for {}", config.name);
            return report.complete();
        }

        // Notifying
        let payload = AlertPayload::new(&config.name, alerts);
        let channel_reports = self.dispatcher.dispatch(&payload).await;
        report.notified = delivered(&channel_reports);

        if report.notified {
            // Commit only after delivery so a transient channel outage
            // re-alerts next cycle instead of silently losing a listing
            let now = Utc::now();
            for listing in &fresh {
                if let Err(e) = self
                    .store
                    .mark_seen(&config.name, &listing.identity(), now)
                    .await
                {
                    return report.fail(
                        CycleStage::Notifying,
                        format!("recording notified listings: {e}"),
                    );
                }
            }
        } else if !fresh.is_empty() {
            log::warn!(
                "No channel delivered for {}; {} new listing(s) will be retried next cycle",
                config.name,
                fresh.len()
            );
        }

        report.complete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};

    use crate::error::{AppError, Result};
    use crate::models::{Listing, SeenEntry};
    use crate::notify::{ChannelStatus, NotifyChannel};
    use crate::storage::MemorySeenStore;

    fn match_config(name: &str) -> MatchConfig {
        MatchConfig {
            name: name.to_string(),
            min_tickets: 2,
            max_price: 500.0,
            trustable_seller_only: false,
            notify_seen_tickets: false,
        }
    }

    fn listing(price: f64, quantity: u32) -> Listing {
        Listing {
            price,
            quantity,
            section: None,
            row: None,
            url: String::new(),
            trustable_seller: Some(true),
        }
    }

    /// Source returning a fixed outcome per call.
    struct StubSource {
        outcome: Option<ScrapeOutcome>,
    }

    impl StubSource {
        fn listings(listings: Vec<Listing>) -> Self {
            Self {
                outcome: Some(ScrapeOutcome::Listings(listings)),
            }
        }

        fn not_found() -> Self {
            Self {
                outcome: Some(ScrapeOutcome::PageNotFound),
            }
        }

        fn failing() -> Self {
            Self { outcome: None }
        }
    }

    #[async_trait]
    impl ListingSource for StubSource {
        async fn fetch(&self, config: &MatchConfig) -> Result<ScrapeOutcome> {
            match &self.outcome {
                Some(outcome) => Ok(outcome.clone()),
                None => Err(AppError::scrape(&config.name, "connection reset")),
            }
        }
    }

    /// Channel recording every payload it is asked to send.
    struct RecordingChannel {
        fail: bool,
        payloads: Arc<Mutex<Vec<AlertPayload>>>,
    }

    impl RecordingChannel {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                payloads: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn with_log(fail: bool, payloads: &Arc<Mutex<Vec<AlertPayload>>>) -> Self {
            Self {
                fail,
                payloads: Arc::clone(payloads),
            }
        }
    }

    #[async_trait]
    impl NotifyChannel for RecordingChannel {
        fn name(&self) -> &str {
            "recording"
        }

        async fn send(&self, payload: &AlertPayload) -> ChannelStatus {
            self.payloads.lock().unwrap().push(payload.clone());
            if self.fail {
                ChannelStatus::Failed("stub failure".to_string())
            } else {
                ChannelStatus::Sent
            }
        }
    }

    /// Store whose every operation fails.
    struct BrokenStore;

    #[async_trait]
    impl SeenStore for BrokenStore {
        async fn has_seen(&self, _m: &str, _i: &str) -> Result<bool> {
            Err(AppError::store("disk unavailable"))
        }

        async fn mark_seen(&self, _m: &str, _i: &str, _t: DateTime<Utc>) -> Result<()> {
            Err(AppError::store("disk unavailable"))
        }

        async fn entries(&self, _m: &str) -> Result<Vec<SeenEntry>> {
            Err(AppError::store("disk unavailable"))
        }

        async fn match_names(&self) -> Result<Vec<String>> {
            Err(AppError::store("disk unavailable"))
        }
    }

    #[tokio::test]
    async fn test_new_listing_notified_and_committed() {
        let source = StubSource::listings(vec![listing(450.0, 2)]);
        let store = MemorySeenStore::new();
        let dispatcher = Dispatcher::new(vec![Box::new(RecordingChannel::new(false))]);
        let runner = CycleRunner::new(&source, &store, &dispatcher);

        let config = match_config("Arsenal vs Everton");
        let report = runner.run(&config).await;

        assert!(!report.is_failed());
        assert!(report.notified);
        assert_eq!(report.fresh, 1);
        assert!(
            store
                .has_seen(&config.name, &listing(450.0, 2).identity())
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_failed_delivery_does_not_commit() {
        let source = StubSource::listings(vec![listing(450.0, 2)]);
        let store = MemorySeenStore::new();
        let dispatcher = Dispatcher::new(vec![Box::new(RecordingChannel::new(true))]);
        let runner = CycleRunner::new(&source, &store, &dispatcher);

        let config = match_config("Arsenal vs Everton");
        let report = runner.run(&config).await;

        // Cycle still completes, but the listing stays un-seen for retry
        assert!(!report.is_failed());
        assert!(!report.notified);
        assert!(
            !store
                .has_seen(&config.name, &listing(450.0, 2).identity())
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_no_channels_counts_as_delivered_and_commits() {
        let source = StubSource::listings(vec![listing(450.0, 2)]);
        let store = MemorySeenStore::new();
        let dispatcher = Dispatcher::new(vec![]);
        let runner = CycleRunner::new(&source, &store, &dispatcher);

        let config = match_config("Arsenal vs Everton");
        let report = runner.run(&config).await;

        assert!(report.notified);
        assert!(
            store
                .has_seen(&config.name, &listing(450.0, 2).identity())
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_page_not_found_is_benign() {
        let source = StubSource::not_found();
        let store = MemorySeenStore::new();
        let dispatcher = Dispatcher::new(vec![]);
        let runner = CycleRunner::new(&source, &store, &dispatcher);

        let report = runner.run(&match_config("Arsenal vs Everton")).await;

        assert!(!report.is_failed());
        assert_eq!(report.scraped, 0);
        assert_eq!(report.qualifying, 0);
    }

    #[tokio::test]
    async fn test_scrape_failure_fails_the_cycle() {
        let source = StubSource::failing();
        let store = MemorySeenStore::new();
        let dispatcher = Dispatcher::new(vec![]);
        let runner = CycleRunner::new(&source, &store, &dispatcher);

        let report = runner.run(&match_config("Arsenal vs Everton")).await;

        assert!(report.is_failed());
        assert!(matches!(
            report.outcome,
            CycleOutcome::Failed {
                stage: CycleStage::Scraping,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_store_failure_fails_the_cycle() {
        let source = StubSource::listings(vec![listing(450.0, 2)]);
        let store = BrokenStore;
        let dispatcher = Dispatcher::new(vec![]);
        let runner = CycleRunner::new(&source, &store, &dispatcher);

        let report = runner.run(&match_config("Arsenal vs Everton")).await;

        assert!(matches!(
            report.outcome,
            CycleOutcome::Failed {
                stage: CycleStage::Deduping,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_seen_listing_suppressed_by_default() {
        let qualifying = listing(450.0, 2);
        let source = StubSource::listings(vec![qualifying.clone()]);
        let store = MemorySeenStore::new();
        store
            .mark_seen("Arsenal vs Everton", &qualifying.identity(), Utc::now())
            .await
            .unwrap();

        let dispatcher = Dispatcher::new(vec![Box::new(RecordingChannel::new(false))]);
        let runner = CycleRunner::new(&source, &store, &dispatcher);

        let report = runner.run(&match_config("Arsenal vs Everton")).await;

        // Still qualifies, but nothing new: no dispatch at all
        assert_eq!(report.qualifying, 1);
        assert_eq!(report.fresh, 0);
        assert_eq!(report.seen_again, 1);
        assert!(!report.notified);
    }

    #[tokio::test]
    async fn test_notify_seen_tickets_includes_tagged_listing() {
        let qualifying = listing(450.0, 2);
        let source = StubSource::listings(vec![qualifying.clone()]);
        let store = MemorySeenStore::new();
        store
            .mark_seen("Arsenal vs Everton", &qualifying.identity(), Utc::now())
            .await
            .unwrap();

        let dispatcher = Dispatcher::new(vec![Box::new(RecordingChannel::new(false))]);
        let runner = CycleRunner::new(&source, &store, &dispatcher);

        let mut config = match_config("Arsenal vs Everton");
        config.notify_seen_tickets = true;

        let report = runner.run(&config).await;
        assert!(report.notified);
        assert_eq!(report.seen_again, 1);
    }

    #[tokio::test]
    async fn test_payload_tags_new_and_seen_listings() {
        let old = listing(450.0, 2);
        let new = listing(300.0, 3);
        let source = StubSource::listings(vec![old.clone(), new.clone()]);
        let store = MemorySeenStore::new();
        store
            .mark_seen("Arsenal vs Everton", &old.identity(), Utc::now())
            .await
            .unwrap();

        let payloads = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = Dispatcher::new(vec![Box::new(RecordingChannel::with_log(
            false, &payloads,
        ))]);
        let runner = CycleRunner::new(&source, &store, &dispatcher);

        let mut config = match_config("Arsenal vs Everton");
        config.notify_seen_tickets = true;

        let report = runner.run(&config).await;
        assert_eq!(report.fresh, 1);
        assert_eq!(report.seen_again, 1);
        assert!(report.notified);

        // New listings come first, then seen-again ones, each tagged
        let sent = payloads.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let alerts = &sent[0].listings;
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].listing, new);
        assert!(!alerts[0].seen_again);
        assert_eq!(alerts[1].listing, old);
        assert!(alerts[1].seen_again);
    }
}
