// src/pipeline/filter.rs

//! Listing criteria filter.

use crate::models::{Listing, MatchConfig};

/// Return the listings satisfying all of the match's criteria, in input
/// order. Pure function: no I/O, no side effects.
///
/// A listing qualifies iff its quantity meets `min_tickets`, its price is
/// within `max_price`, and, under `trustable_seller_only`, the seller is
/// positively flagged as trustable (unknown trust status is excluded).
pub fn filter_listings(listings: &[Listing], config: &MatchConfig) -> Vec<Listing> {
    listings
        .iter()
        .filter(|l| matches_criteria(l, config))
        .cloned()
        .collect()
}

fn matches_criteria(listing: &Listing, config: &MatchConfig) -> bool {
    if listing.quantity < config.min_tickets {
        return false;
    }
    if listing.price > config.max_price {
        return false;
    }
    if config.trustable_seller_only && listing.trustable_seller != Some(true) {
        return false;
    }
    true
}
