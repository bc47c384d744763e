// src/pipeline/mod.rs

//! Monitoring pipeline: per-match check cycles and the pass scheduler.
//!
//! - `filter_listings`: apply one match's criteria to raw listings
//! - `CycleRunner`: scrape → filter → dedup → notify for one match
//! - `run_pass` / `run_forever`: drive cycles across all matches

pub mod cycle;
pub mod filter;
pub mod schedule;

pub use cycle::{CycleOutcome, CycleReport, CycleRunner, CycleStage};
pub use filter::filter_listings;
pub use schedule::{PassSummary, run_forever, run_pass};
