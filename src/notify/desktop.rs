// src/notify/desktop.rs

//! OS desktop notification channel.

use async_trait::async_trait;

use crate::notify::{AlertPayload, ChannelStatus, NotifyChannel};

/// Shows an OS-level toast with a short alert summary.
#[derive(Debug, Default)]
pub struct DesktopChannel;

impl DesktopChannel {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotifyChannel for DesktopChannel {
    fn name(&self) -> &str {
        "desktop"
    }

    async fn send(&self, payload: &AlertPayload) -> ChannelStatus {
        let title = payload.title();
        let body = payload.summary();

        // notify-rust talks to the notification daemon synchronously
        let result = tokio::task::spawn_blocking(move || {
            notify_rust::Notification::new()
                .summary(&title)
                .body(&body)
                .show()
        })
        .await;

        match result {
            Ok(Ok(_)) => ChannelStatus::Sent,
            Ok(Err(e)) => ChannelStatus::Failed(e.to_string()),
            Err(e) => ChannelStatus::Failed(format!("notification task: {e}")),
        }
    }
}
