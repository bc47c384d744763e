// src/models/config.rs

//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Polling and HTTP behavior settings
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Monitored matches
    #[serde(default)]
    pub matches: Vec<MatchConfig>,

    /// Notification channel settings
    #[serde(default)]
    pub channels: ChannelsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.monitor.base_url.trim().is_empty() {
            return Err(AppError::config("monitor.base_url is empty"));
        }
        if self.monitor.check_interval_minutes == 0 {
            return Err(AppError::config(
                "monitor.check_interval_minutes must be > 0",
            ));
        }
        if self.monitor.timeout_secs == 0 {
            return Err(AppError::config("monitor.timeout_secs must be > 0"));
        }
        if self.matches.is_empty() {
            return Err(AppError::config("No matches defined"));
        }

        let mut names = HashSet::new();
        for m in &self.matches {
            if m.name.trim().is_empty() {
                return Err(AppError::config("match name is empty"));
            }
            if !names.insert(m.name.as_str()) {
                return Err(AppError::config(format!("duplicate match '{}'", m.name)));
            }
            if m.min_tickets == 0 {
                return Err(AppError::config(format!(
                    "min_tickets must be > 0 for '{}'",
                    m.name
                )));
            }
            if m.max_price <= 0.0 {
                return Err(AppError::config(format!(
                    "max_price must be > 0 for '{}'",
                    m.name
                )));
            }
        }

        self.channels.validate()
    }
}

/// Polling and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Base URL of the ticket resale site
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Minutes to sleep between passes in watch mode
    #[serde(default = "defaults::check_interval")]
    pub check_interval_minutes: u64,

    /// Delay between per-match fetches within one pass, in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Path of the seen-listing store file
    #[serde(default = "defaults::seen_db")]
    pub seen_db: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            check_interval_minutes: defaults::check_interval(),
            request_delay_ms: defaults::request_delay(),
            timeout_secs: defaults::timeout(),
            user_agent: defaults::user_agent(),
            seen_db: defaults::seen_db(),
        }
    }
}

/// One monitored fixture and its listing criteria.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Human-readable match name, e.g. "Arsenal vs Everton".
    /// Also determines the event page URL.
    pub name: String,

    /// Minimum ticket quantity a listing must offer
    #[serde(default = "defaults::min_tickets")]
    pub min_tickets: u32,

    /// Maximum acceptable price per ticket
    #[serde(default = "defaults::max_price")]
    pub max_price: f64,

    /// Only accept listings from sellers the site flags as trustable
    #[serde(default)]
    pub trustable_seller_only: bool,

    /// Notify about all qualifying listings every cycle, not just new ones
    #[serde(default)]
    pub notify_seen_tickets: bool,
}

impl MatchConfig {
    /// Event page URL for this match.
    ///
    /// "Arsenal vs Everton" becomes "{base}/tickets-arsenal-everton".
    pub fn event_url(&self, base_url: &str) -> String {
        let slug = self
            .name
            .to_lowercase()
            .replace(" vs ", "-")
            .replace(' ', "-");
        format!("{}/tickets-{}", base_url.trim_end_matches('/'), slug)
    }
}

/// Notification channel enablement and credentials.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChannelsConfig {
    /// SMTP email alerts
    #[serde(default)]
    pub email: EmailConfig,

    /// Pushover push notifications
    #[serde(default)]
    pub pushover: PushoverConfig,

    /// OS desktop notifications
    #[serde(default)]
    pub desktop: DesktopConfig,
}

impl ChannelsConfig {
    fn validate(&self) -> Result<()> {
        if self.email.enabled {
            if self.email.smtp_server.trim().is_empty() {
                return Err(AppError::config("channels.email.smtp_server is empty"));
            }
            if self.email.username.trim().is_empty() || self.email.to.trim().is_empty() {
                return Err(AppError::config(
                    "channels.email requires username and to when enabled",
                ));
            }
        }
        if self.pushover.enabled
            && (self.pushover.api_token.trim().is_empty() || self.pushover.user_key.trim().is_empty())
        {
            return Err(AppError::config(
                "channels.pushover requires api_token and user_key when enabled",
            ));
        }
        Ok(())
    }
}

/// SMTP email settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "defaults::smtp_server")]
    pub smtp_server: String,

    #[serde(default = "defaults::smtp_port")]
    pub smtp_port: u16,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Recipient address
    #[serde(default)]
    pub to: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_server: defaults::smtp_server(),
            smtp_port: defaults::smtp_port(),
            username: String::new(),
            password: String::new(),
            to: String::new(),
        }
    }
}

/// Pushover API settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PushoverConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub api_token: String,

    #[serde(default)]
    pub user_key: String,
}

/// Desktop notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesktopConfig {
    #[serde(default = "defaults::desktop_enabled")]
    pub enabled: bool,
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::desktop_enabled(),
        }
    }
}

/// Default configuration values.
mod defaults {
    pub fn base_url() -> String {
        "https://fanpass.net".to_string()
    }

    pub fn check_interval() -> u64 {
        30
    }

    pub fn request_delay() -> u64 {
        2000
    }

    pub fn timeout() -> u64 {
        30
    }

    pub fn user_agent() -> String {
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
            .to_string()
    }

    pub fn seen_db() -> String {
        "data/seen_listings.json".to_string()
    }

    pub fn min_tickets() -> u32 {
        1
    }

    pub fn max_price() -> f64 {
        500.0
    }

    pub fn smtp_server() -> String {
        "smtp.gmail.com".to_string()
    }

    pub fn smtp_port() -> u16 {
        587
    }

    pub fn desktop_enabled() -> bool {
        true
    }
}
