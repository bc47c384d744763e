// src/main.rs

//! ticketwatch CLI
//!
//! Monitors fanpass.net event pages for configured matches and alerts on
//! qualifying ticket listings.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use ticketwatch::{
    error::Result,
    models::Config,
    notify::Dispatcher,
    pipeline::{CycleRunner, run_forever, run_pass},
    services::ListingScraper,
    storage::{LocalSeenStore, SeenStore},
    utils::http,
};

/// ticketwatch - fanpass.net ticket listing monitor
#[derive(Parser, Debug)]
#[command(name = "ticketwatch", version, about = "Ticket listing monitor")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a single pass over all matches, then exit.
    /// Exits nonzero if any match cycle failed.
    Check,

    /// Monitor continuously at the configured interval
    Watch,

    /// Validate the configuration file
    Validate,

    /// Show matches with recorded listings, or the listings of one match
    History {
        /// Match name to list entries for
        match_name: Option<String>,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::load(&cli.config)?;
    config.validate()?;

    match cli.command {
        Command::Validate => {
            log::info!(
                "Configuration OK: {} match(es), checking every {} minute(s)",
                config.matches.len(),
                config.monitor.check_interval_minutes
            );
            for m in &config.matches {
                log::info!("  {} -> {}", m.name, m.event_url(&config.monitor.base_url));
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::History { match_name } => {
            let store = LocalSeenStore::open(&config.monitor.seen_db).await?;
            match match_name {
                Some(name) => {
                    for entry in store.entries(&name).await? {
                        println!("{}  {}", entry.first_seen.to_rfc3339(), entry.identity);
                    }
                }
                None => {
                    for name in store.match_names().await? {
                        println!("{}", name);
                    }
                }
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Check | Command::Watch => {
            let watch = matches!(cli.command, Command::Watch);

            let client = http::create_async_client(&config.monitor)?;
            let scraper = ListingScraper::new(client.clone(), &config.monitor)?;
            let store = LocalSeenStore::open(&config.monitor.seen_db).await?;
            let dispatcher = Dispatcher::from_config(&config.channels, &client)?;

            log::info!("ticketwatch starting: {} match(es)", config.matches.len());
            for m in &config.matches {
                log::info!(
                    "  {}: min {} ticket(s), max £{:.2}, trusted only: {}, re-notify seen: {}",
                    m.name,
                    m.min_tickets,
                    m.max_price,
                    m.trustable_seller_only,
                    m.notify_seen_tickets
                );
            }
            if dispatcher.channel_count() == 0 {
                log::warn!("No notification channels enabled; alerts will only be logged");
            }

            let runner = CycleRunner::new(&scraper, &store, &dispatcher);
            let request_delay = Duration::from_millis(config.monitor.request_delay_ms);

            if watch {
                let interval =
                    Duration::from_secs(config.monitor.check_interval_minutes * 60);
                log::info!(
                    "Monitoring continuously, every {} minute(s)",
                    config.monitor.check_interval_minutes
                );
                run_forever(&runner, &config.matches, request_delay, interval).await;
                Ok(ExitCode::SUCCESS)
            } else {
                let summary = run_pass(&runner, &config.matches, request_delay).await;
                if summary.has_failures() {
                    Ok(ExitCode::FAILURE)
                } else {
                    Ok(ExitCode::SUCCESS)
                }
            }
        }
    }
}
