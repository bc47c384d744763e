// src/models/listing.rs

//! Ticket listing data structure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A ticket listing scraped from an event page.
///
/// Constructed fresh each cycle and never mutated. Only the identity
/// fingerprint survives a cycle, via the seen store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    /// Price per ticket, in the site's currency (GBP)
    pub price: f64,

    /// Number of tickets available in this listing
    pub quantity: u32,

    /// Stand/section name, when the page exposes one
    pub section: Option<String>,

    /// Row within the section, when the page exposes one
    pub row: Option<String>,

    /// Link to the listing (falls back to the event page URL)
    pub url: String,

    /// Seller trust marker: `Some(true)` when the site flags the seller
    /// as trustable, `None` when no marker is present
    pub trustable_seller: Option<bool>,
}

impl Listing {
    /// Stable fingerprint identifying this listing across cycles.
    ///
    /// Two listings scraped at different times with the same price,
    /// quantity, section and row are the same listing. The URL is
    /// excluded: listings without their own link fall back to the event
    /// URL, which would make the fingerprint depend on page layout.
    pub fn identity(&self) -> String {
        let input = format!(
            "{:.2}|{}|{}|{}",
            self.price,
            self.quantity,
            self.section.as_deref().unwrap_or(""),
            self.row.as_deref().unwrap_or("")
        );
        let digest = Sha256::digest(input.as_bytes());
        hex::encode(digest)
    }

    /// One-line summary for log output.
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("£{:.2} x{}", self.price, self.quantity)];
        if let Some(section) = &self.section {
            parts.push(section.clone());
        }
        if let Some(row) = &self.row {
            parts.push(format!("row {}", row));
        }
        parts.join(", ")
    }
}

/// A persisted record of a listing that already triggered a notification.
///
/// Created once per `(match_name, identity)` pair and never updated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeenEntry {
    /// Match the listing was notified for
    pub match_name: String,

    /// Listing fingerprint (see [`Listing::identity`])
    pub identity: String,

    /// When the listing first triggered a notification
    pub first_seen: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_listing() -> Listing {
        Listing {
            price: 450.0,
            quantity: 2,
            section: Some("North Stand".to_string()),
            row: Some("14".to_string()),
            url: "https://fanpass.net/tickets-arsenal-everton".to_string(),
            trustable_seller: Some(true),
        }
    }

    #[test]
    fn test_identity_stable_across_clones() {
        let a = sample_listing();
        let b = a.clone();
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn test_identity_ignores_url_and_trust() {
        let a = sample_listing();
        let mut b = sample_listing();
        b.url = "https://fanpass.net/buy/12345".to_string();
        b.trustable_seller = None;
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn test_identity_distinguishes_fields() {
        let base = sample_listing();

        let mut price = sample_listing();
        price.price = 451.0;
        assert_ne!(base.identity(), price.identity());

        let mut quantity = sample_listing();
        quantity.quantity = 3;
        assert_ne!(base.identity(), quantity.identity());

        let mut row = sample_listing();
        row.row = Some("15".to_string());
        assert_ne!(base.identity(), row.identity());

        let mut section = sample_listing();
        section.section = None;
        assert_ne!(base.identity(), section.identity());
    }

    #[test]
    fn test_summary_omits_missing_fields() {
        let mut listing = sample_listing();
        listing.section = None;
        listing.row = None;
        assert_eq!(listing.summary(), "£450.00 x2");
    }
}
