// src/notify/payload.rs

//! Alert payload and message formatting.

use crate::models::Listing;

/// One listing inside an alert, tagged with its dedup status.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertListing {
    pub listing: Listing,
    /// True when this listing was already notified in an earlier cycle
    /// and is included because `notify_seen_tickets` is set.
    pub seen_again: bool,
}

/// Notification payload for one match cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertPayload {
    pub match_name: String,
    pub listings: Vec<AlertListing>,
}

impl AlertPayload {
    pub fn new(match_name: impl Into<String>, listings: Vec<AlertListing>) -> Self {
        Self {
            match_name: match_name.into(),
            listings,
        }
    }

    /// Subject/title line shared by all channels.
    pub fn title(&self) -> String {
        format!("Ticket Alert: {}", self.match_name)
    }

    /// Short one-line summary for constrained channels.
    pub fn summary(&self) -> String {
        format!(
            "Found {} matching ticket(s) for {}",
            self.listings.len(),
            self.match_name
        )
    }

    /// Full plain-text message body.
    pub fn message(&self) -> String {
        let mut lines = vec![
            format!(
                "Found {} matching ticket(s) for {}!",
                self.listings.len(),
                self.match_name
            ),
            String::new(),
        ];

        for (i, alert) in self.listings.iter().enumerate() {
            let listing = &alert.listing;

            if alert.seen_again {
                lines.push(format!("Ticket {} (seen before):", i + 1));
            } else {
                lines.push(format!("Ticket {}:", i + 1));
            }
            lines.push(format!("  Price: £{:.2}", listing.price));
            lines.push(format!("  Quantity: {}", listing.quantity));

            if listing.trustable_seller == Some(true) {
                lines.push("  Trustable Seller: ✓".to_string());
            }
            if let Some(section) = &listing.section {
                lines.push(format!("  Section: {}", section));
            }
            if let Some(row) = &listing.row {
                lines.push(format!("  Row: {}", row));
            }
            if !listing.url.is_empty() {
                lines.push(format!("  Link: {}", listing.url));
            }

            lines.push(String::new());
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> Listing {
        Listing {
            price: 450.0,
            quantity: 2,
            section: Some("North Stand".to_string()),
            row: Some("14".to_string()),
            url: "https://fanpass.net/buy/12345".to_string(),
            trustable_seller: Some(true),
        }
    }

    #[test]
    fn test_message_includes_listing_details() {
        let payload = AlertPayload::new(
            "Arsenal vs Everton",
            vec![AlertListing {
                listing: listing(),
                seen_again: false,
            }],
        );

        let message = payload.message();
        assert!(message.contains("Found 1 matching ticket(s) for Arsenal vs Everton!"));
        assert!(message.contains("Price: £450.00"));
        assert!(message.contains("Quantity: 2"));
        assert!(message.contains("Trustable Seller: ✓"));
        assert!(message.contains("Section: North Stand"));
        assert!(message.contains("Row: 14"));
        assert!(message.contains("Link: https://fanpass.net/buy/12345"));
        assert!(!message.contains("seen before"));
    }

    #[test]
    fn test_message_tags_seen_again_listings() {
        let payload = AlertPayload::new(
            "Arsenal vs Everton",
            vec![AlertListing {
                listing: listing(),
                seen_again: true,
            }],
        );

        assert!(payload.message().contains("Ticket 1 (seen before):"));
    }

    #[test]
    fn test_message_omits_absent_fields() {
        let mut bare = listing();
        bare.section = None;
        bare.row = None;
        bare.trustable_seller = None;

        let payload = AlertPayload::new(
            "Arsenal vs Everton",
            vec![AlertListing {
                listing: bare,
                seen_again: false,
            }],
        );

        let message = payload.message();
        assert!(!message.contains("Section:"));
        assert!(!message.contains("Row:"));
        assert!(!message.contains("Trustable Seller"));
    }

    #[test]
    fn test_title_and_summary() {
        let payload = AlertPayload::new("Arsenal vs Everton", vec![]);
        assert_eq!(payload.title(), "Ticket Alert: Arsenal vs Everton");
        assert_eq!(
            payload.summary(),
            "Found 0 matching ticket(s) for Arsenal vs Everton"
        );
    }
}
