// src/notify/pushover.rs

//! Pushover push notification channel.

use async_trait::async_trait;
use reqwest::Client;

use crate::models::PushoverConfig;
use crate::notify::{AlertPayload, ChannelStatus, NotifyChannel};

const PUSHOVER_API_URL: &str = "https://api.pushover.net/1/messages.json";

/// Sends alerts through the Pushover message API.
pub struct PushoverChannel {
    client: Client,
    api_token: String,
    user_key: String,
}

impl PushoverChannel {
    pub fn new(config: &PushoverConfig, client: Client) -> Self {
        Self {
            client,
            api_token: config.api_token.clone(),
            user_key: config.user_key.clone(),
        }
    }
}

#[async_trait]
impl NotifyChannel for PushoverChannel {
    fn name(&self) -> &str {
        "pushover"
    }

    async fn send(&self, payload: &AlertPayload) -> ChannelStatus {
        let title = payload.title();
        let message = payload.message();
        let form = [
            ("token", self.api_token.as_str()),
            ("user", self.user_key.as_str()),
            ("title", title.as_str()),
            ("message", message.as_str()),
            // High priority: a matching ticket is time-sensitive
            ("priority", "1"),
        ];

        let result = self
            .client
            .post(PUSHOVER_API_URL)
            .form(&form)
            .send()
            .await
            .and_then(|response| response.error_for_status());

        match result {
            Ok(_) => ChannelStatus::Sent,
            Err(e) => ChannelStatus::Failed(e.to_string()),
        }
    }
}
