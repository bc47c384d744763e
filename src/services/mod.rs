// src/services/mod.rs

//! Service layer for the ticket monitor.
//!
//! This module contains the external-facing boundaries:
//! - Event page scraping (`ListingScraper`)

mod scraper;

pub use scraper::{ListingScraper, ListingSource, ScrapeOutcome};
