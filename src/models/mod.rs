// src/models/mod.rs

//! Domain models for the ticket monitor.

mod config;
mod listing;

// Re-export all public types
pub use config::{
    ChannelsConfig, Config, DesktopConfig, EmailConfig, MatchConfig, MonitorConfig, PushoverConfig,
};
pub use listing::{Listing, SeenEntry};
