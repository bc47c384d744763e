// src/notify/email.rs

//! SMTP email notification channel.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::error::{AppError, Result};
use crate::models::EmailConfig;
use crate::notify::{AlertPayload, ChannelStatus, NotifyChannel};

/// Sends alerts by email over SMTP with STARTTLS.
pub struct EmailChannel {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailChannel {
    /// Build the SMTP transport from configuration. Fails fast on a bad
    /// relay host or malformed addresses; send-time failures are reported
    /// per dispatch instead.
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_server)
            .map_err(|e| AppError::config(format!("SMTP relay {}: {}", config.smtp_server, e)))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        let from: Mailbox = config
            .username
            .parse()
            .map_err(|e| AppError::config(format!("email.username: {e}")))?;
        let to: Mailbox = config
            .to
            .parse()
            .map_err(|e| AppError::config(format!("email.to: {e}")))?;

        Ok(Self {
            transport,
            from,
            to,
        })
    }
}

#[async_trait]
impl NotifyChannel for EmailChannel {
    fn name(&self) -> &str {
        "email"
    }

    async fn send(&self, payload: &AlertPayload) -> ChannelStatus {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(payload.title())
            .header(ContentType::TEXT_PLAIN)
            .body(payload.message());

        let message = match message {
            Ok(m) => m,
            Err(e) => return ChannelStatus::Failed(format!("build message: {e}")),
        };

        match self.transport.send(message).await {
            Ok(_) => ChannelStatus::Sent,
            Err(e) => ChannelStatus::Failed(e.to_string()),
        }
    }
}
