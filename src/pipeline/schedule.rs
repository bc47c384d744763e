// src/pipeline/schedule.rs

//! Pass scheduling: one sweep over all configured matches, either once or
//! repeated at a fixed interval.
//!
//! Recovery policy is retry-by-rerun: a failed cycle is logged and simply
//! runs again next pass. No backoff, no in-pass retries.

use std::time::Duration;

use crate::models::MatchConfig;
use crate::pipeline::{CycleReport, CycleRunner};

/// Outcome of one pass over all matches.
#[derive(Debug)]
pub struct PassSummary {
    pub reports: Vec<CycleReport>,
}

impl PassSummary {
    pub fn completed(&self) -> usize {
        self.reports.iter().filter(|r| !r.is_failed()).count()
    }

    pub fn failed(&self) -> usize {
        self.reports.iter().filter(|r| r.is_failed()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }
}

/// Run one cycle for every match, sequentially.
///
/// Matches are isolated: a failed cycle is recorded in the summary and the
/// pass moves on. A polite delay separates consecutive fetches.
pub async fn run_pass(
    runner: &CycleRunner<'_>,
    matches: &[MatchConfig],
    request_delay: Duration,
) -> PassSummary {
    log::info!("Starting pass over {} match(es)", matches.len());

    let mut reports = Vec::with_capacity(matches.len());
    for (i, config) in matches.iter().enumerate() {
        reports.push(runner.run(config).await);

        if i + 1 < matches.len() && !request_delay.is_zero() {
            tokio::time::sleep(request_delay).await;
        }
    }

    let summary = PassSummary { reports };
    log::info!(
        "Pass complete: {} ok, {} failed",
        summary.completed(),
        summary.failed()
    );
    summary
}

/// Run passes forever at a fixed interval, until the process is killed.
pub async fn run_forever(
    runner: &CycleRunner<'_>,
    matches: &[MatchConfig],
    request_delay: Duration,
    interval: Duration,
) {
    loop {
        let summary = run_pass(runner, matches, request_delay).await;
        if summary.has_failures() {
            log::warn!(
                "{} match(es) failed this pass; retrying next interval",
                summary.failed()
            );
        }

        log::info!("Next pass in {}s", interval.as_secs());
        tokio::time::sleep(interval).await;
    }
}
