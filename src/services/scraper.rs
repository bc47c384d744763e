// src/services/scraper.rs

//! Listing scraper service.
//!
//! Fetches an event page and extracts ticket listings from the rendered
//! markup. Pure fetch-and-parse boundary: no filtering, no deduplication,
//! no persistence.

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, StatusCode};
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{Listing, MatchConfig, MonitorConfig};
use crate::utils::resolve_url;

/// Result of scraping one event page.
#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeOutcome {
    /// The page exists; zero or more listings were extracted.
    Listings(Vec<Listing>),
    /// The event page does not exist for this match name. Benign: the
    /// event may simply not be listed yet.
    PageNotFound,
}

/// Source of raw listings for one match.
///
/// Transient failures (network, timeout, unexpected status) surface as
/// `Err(AppError::Scrape { .. })`.
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch(&self, config: &MatchConfig) -> Result<ScrapeOutcome>;
}

/// CSS selectors for the fanpass.net listing markup.
struct ListingSelectors {
    row: Selector,
    price: Selector,
    trust: Selector,
    section: Selector,
    seat_row: Selector,
    link: Selector,
}

impl ListingSelectors {
    fn new() -> Result<Self> {
        Ok(Self {
            row: parse_selector(".listing-row")?,
            price: parse_selector(".price")?,
            trust: parse_selector(r#".by-trustable-seller, [data-blue-rh="true"]"#)?,
            section: parse_selector(r#"[class*="section"], [class*="stand"], [data-section]"#)?,
            seat_row: parse_selector(r#"[class*="row"], [data-row]"#)?,
            link: parse_selector(r#"a[href*="ticket"], a[href*="buy"]"#)?,
        })
    }
}

/// Scrapes ticket listings from fanpass.net event pages.
pub struct ListingScraper {
    client: Client,
    base_url: String,
    selectors: ListingSelectors,
    price_pattern: Regex,
}

impl ListingScraper {
    /// Create a new scraper using the given HTTP client.
    pub fn new(client: Client, config: &MonitorConfig) -> Result<Self> {
        // Matches the numeric part of price text like "£336" or "£1,336.50"
        let price_pattern = Regex::new(r"\d+\.?\d*")
            .map_err(|e| AppError::scrape("price pattern", e))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            selectors: ListingSelectors::new()?,
            price_pattern,
        })
    }

    /// Extract all listings from a rendered event page.
    fn extract_listings(&self, html: &str, event_url: &str) -> Result<Vec<Listing>> {
        let document = Html::parse_document(html);
        let base = url::Url::parse(event_url)?;

        let mut listings = Vec::new();
        let mut dropped = 0usize;

        for row in document.select(&self.selectors.row) {
            match self.parse_listing_row(&row, &base, event_url) {
                Some(listing) => listings.push(listing),
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            log::warn!(
                "Dropped {} listing(s) missing price or quantity on {}",
                dropped,
                event_url
            );
        }

        Ok(listings)
    }

    /// Parse a single `.listing-row` element.
    ///
    /// Returns `None` when a required field (price, quantity) is missing;
    /// optional fields (section, row, trust marker) degrade gracefully.
    fn parse_listing_row(
        &self,
        row: &ElementRef<'_>,
        base: &url::Url,
        event_url: &str,
    ) -> Option<Listing> {
        let price = self.extract_price(row)?;
        let quantity = Self::extract_quantity(row)?;

        let trustable_seller = if row.select(&self.selectors.trust).next().is_some() {
            Some(true)
        } else {
            // No marker on the page: trust status unknown
            None
        };

        let section = self.extract_text(row, &self.selectors.section);
        let seat_row = self.extract_text(row, &self.selectors.seat_row);

        let url = row
            .select(&self.selectors.link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(|href| resolve_url(base, href))
            .unwrap_or_else(|| event_url.to_string());

        Some(Listing {
            price,
            quantity,
            section,
            row: seat_row,
            url,
            trustable_seller,
        })
    }

    /// Extract the per-ticket price from the `.price` element.
    fn extract_price(&self, row: &ElementRef<'_>) -> Option<f64> {
        let price_elem = row.select(&self.selectors.price).next()?;
        let text: String = price_elem.text().collect();
        let cleaned = text.replace(',', "");
        let digits = self.price_pattern.find(&cleaned)?;
        digits.as_str().parse().ok()
    }

    /// Extract the ticket quantity from the row's `data-desired` attribute.
    fn extract_quantity(row: &ElementRef<'_>) -> Option<u32> {
        row.value().attr("data-desired")?.trim().parse().ok()
    }

    /// First non-empty descendant text for a selector, excluding the row
    /// element itself (`.listing-row` would match `[class*="row"]`).
    fn extract_text(&self, row: &ElementRef<'_>, selector: &Selector) -> Option<String> {
        row.select(selector)
            .filter(|el| el.id() != row.id())
            .map(|el| el.text().collect::<String>().trim().to_string())
            .find(|text| !text.is_empty())
    }
}

#[async_trait]
impl ListingSource for ListingScraper {
    async fn fetch(&self, config: &MatchConfig) -> Result<ScrapeOutcome> {
        let event_url = config.event_url(&self.base_url);
        log::debug!("Fetching {}", event_url);

        let response = self
            .client
            .get(&event_url)
            .send()
            .await
            .map_err(|e| AppError::scrape(&config.name, e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(ScrapeOutcome::PageNotFound);
        }
        if !response.status().is_success() {
            return Err(AppError::scrape(
                &config.name,
                format!("unexpected status {}", response.status()),
            ));
        }

        let html = response
            .text()
            .await
            .map_err(|e| AppError::scrape(&config.name, e))?;

        let listings = self.extract_listings(&html, &event_url)?;
        log::info!("Found {} listing(s) for {}", listings.len(), config.name);

        Ok(ScrapeOutcome::Listings(listings))
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVENT_URL: &str = "https://fanpass.net/tickets-arsenal-everton";

    fn scraper() -> ListingScraper {
        ListingScraper::new(Client::new(), &MonitorConfig::default()).unwrap()
    }

    #[test]
    fn test_parse_selector_valid() {
        assert!(parse_selector(".listing-row").is_ok());
        assert!(parse_selector(r#"[data-blue-rh="true"]"#).is_ok());
    }

    #[test]
    fn test_parse_selector_invalid() {
        assert!(parse_selector("[[invalid").is_err());
    }

    #[test]
    fn test_extract_full_listing() {
        let html = r#"
            <div class="listing-row" data-desired="2">
                <div class="price">£450</div>
                <div class="status" data-blue-rh="true"></div>
                <div class="section-name">North Stand</div>
                <div class="seat-row">14</div>
                <a href="/buy/12345">Buy</a>
            </div>
        "#;

        let listings = scraper().extract_listings(html, EVENT_URL).unwrap();
        assert_eq!(listings.len(), 1);

        let listing = &listings[0];
        assert_eq!(listing.price, 450.0);
        assert_eq!(listing.quantity, 2);
        assert_eq!(listing.section.as_deref(), Some("North Stand"));
        assert_eq!(listing.row.as_deref(), Some("14"));
        assert_eq!(listing.url, "https://fanpass.net/buy/12345");
        assert_eq!(listing.trustable_seller, Some(true));
    }

    #[test]
    fn test_extract_price_with_thousands_separator() {
        let html = r#"
            <div class="listing-row" data-desired="4">
                <div class="price">£1,336.50</div>
            </div>
        "#;

        let listings = scraper().extract_listings(html, EVENT_URL).unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].price, 1336.5);
    }

    #[test]
    fn test_missing_optional_fields() {
        let html = r#"
            <div class="listing-row" data-desired="1">
                <div class="price">£99</div>
            </div>
        "#;

        let listings = scraper().extract_listings(html, EVENT_URL).unwrap();
        assert_eq!(listings.len(), 1);

        let listing = &listings[0];
        assert_eq!(listing.section, None);
        assert_eq!(listing.row, None);
        assert_eq!(listing.trustable_seller, None);
        // No per-listing link: falls back to the event page
        assert_eq!(listing.url, EVENT_URL);
    }

    #[test]
    fn test_rows_missing_required_fields_are_dropped() {
        let html = r#"
            <div class="listing-row" data-desired="2">
                <div class="notice">Sold out</div>
            </div>
            <div class="listing-row">
                <div class="price">£200</div>
            </div>
            <div class="listing-row" data-desired="3">
                <div class="price">£150</div>
            </div>
        "#;

        let listings = scraper().extract_listings(html, EVENT_URL).unwrap();
        // First row has no price, second no quantity
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].price, 150.0);
        assert_eq!(listings[0].quantity, 3);
    }

    #[test]
    fn test_trustable_seller_class_marker() {
        let html = r#"
            <div class="listing-row" data-desired="2">
                <div class="price">£300</div>
                <span class="by-trustable-seller"></span>
            </div>
        "#;

        let listings = scraper().extract_listings(html, EVENT_URL).unwrap();
        assert_eq!(listings[0].trustable_seller, Some(true));
    }

    #[test]
    fn test_order_preserved() {
        let html = r#"
            <div class="listing-row" data-desired="1"><div class="price">£100</div></div>
            <div class="listing-row" data-desired="1"><div class="price">£200</div></div>
            <div class="listing-row" data-desired="1"><div class="price">£300</div></div>
        "#;

        let listings = scraper().extract_listings(html, EVENT_URL).unwrap();
        let prices: Vec<f64> = listings.iter().map(|l| l.price).collect();
        assert_eq!(prices, vec![100.0, 200.0, 300.0]);
    }
}
