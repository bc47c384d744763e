// src/notify/mod.rs

//! Notification channels and the fan-out dispatcher.
//!
//! Each channel is a small capability behind [`NotifyChannel`]; the
//! [`Dispatcher`] invokes every enabled channel independently. A channel
//! failure is data (`ChannelStatus::Failed`), never an error that could
//! abort the other channels or the cycle.

#[cfg(feature = "desktop")]
mod desktop;
mod email;
mod payload;
mod pushover;

use async_trait::async_trait;
use futures::future::join_all;

use crate::error::Result;
use crate::models::ChannelsConfig;

#[cfg(feature = "desktop")]
pub use desktop::DesktopChannel;
pub use email::EmailChannel;
pub use payload::{AlertListing, AlertPayload};
pub use pushover::PushoverChannel;

/// Outcome of one channel's send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelStatus {
    Sent,
    Failed(String),
}

/// Per-channel outcome of a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelReport {
    pub channel: String,
    pub status: ChannelStatus,
}

/// A single notification transport.
#[async_trait]
pub trait NotifyChannel: Send + Sync {
    /// Channel name for logs and reports.
    fn name(&self) -> &str;

    /// Attempt to deliver the payload. Must not panic; all failure modes
    /// are reported through the returned status.
    async fn send(&self, payload: &AlertPayload) -> ChannelStatus;
}

/// Whether a dispatch counts as delivered: at least one channel sent, or
/// no channel was enabled at all (log-only operation, no alert expected).
pub fn delivered(reports: &[ChannelReport]) -> bool {
    reports.is_empty() || reports.iter().any(|r| r.status == ChannelStatus::Sent)
}

/// Fans a payload out to all enabled channels.
pub struct Dispatcher {
    channels: Vec<Box<dyn NotifyChannel>>,
}

impl Dispatcher {
    /// Create a dispatcher over an explicit channel set.
    pub fn new(channels: Vec<Box<dyn NotifyChannel>>) -> Self {
        Self { channels }
    }

    /// Build the channel set from configuration. Disabled channels are
    /// not constructed at all.
    pub fn from_config(config: &ChannelsConfig, client: &reqwest::Client) -> Result<Self> {
        let mut channels: Vec<Box<dyn NotifyChannel>> = Vec::new();

        if config.email.enabled {
            channels.push(Box::new(EmailChannel::new(&config.email)?));
        }
        if config.pushover.enabled {
            channels.push(Box::new(PushoverChannel::new(
                &config.pushover,
                client.clone(),
            )));
        }
        if config.desktop.enabled {
            #[cfg(feature = "desktop")]
            channels.push(Box::new(DesktopChannel::new()));
            #[cfg(not(feature = "desktop"))]
            log::warn!("Desktop notifications enabled but binary was built without the 'desktop' feature");
        }

        Ok(Self { channels })
    }

    /// Number of enabled channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Send the payload on every channel, independently and concurrently.
    ///
    /// With no channels enabled the payload is logged and the empty report
    /// list counts as delivered.
    pub async fn dispatch(&self, payload: &AlertPayload) -> Vec<ChannelReport> {
        if self.channels.is_empty() {
            log::info!("No notification channels enabled; logging alert only");
            log::info!("{}", payload.message());
            return Vec::new();
        }

        let sends = self.channels.iter().map(|channel| async {
            let status = channel.send(payload).await;
            ChannelReport {
                channel: channel.name().to_string(),
                status,
            }
        });

        let reports = join_all(sends).await;

        for report in &reports {
            match &report.status {
                ChannelStatus::Sent => {
                    log::info!("Notification sent via {}", report.channel);
                }
                ChannelStatus::Failed(reason) => {
                    log::warn!("Notification via {} failed: {}", report.channel, reason);
                }
            }
        }

        reports
    }
}
