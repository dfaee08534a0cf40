// SPDX-FileCopyrightText: 2026 Yotei Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! yotei - Slack schedule extraction and notification.
//!
//! This is the binary entry point for the yotei pipeline: three batch jobs
//! (fetch, analyze, notify) plus a long-running scheduler driving them on
//! cron expressions.

mod runner;
mod scheduler;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};
use tracing::error;

/// yotei - Slack schedule extraction and notification.
#[derive(Parser, Debug)]
#[command(name = "yotei", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch channel history and store new messages.
    FetchMessages,
    /// Analyze unanalyzed messages and extract scheduled events.
    AnalyzeMessages,
    /// Notify the destination channel about today's due events.
    NotifyEvents,
    /// Run all three jobs on their configured cron schedules.
    Schedule,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match yotei_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            yotei_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.app.log_level);

    let result = match cli.command {
        Some(Commands::FetchMessages) => runner::run_fetch(&config).await,
        Some(Commands::AnalyzeMessages) => runner::run_analyze(&config).await,
        Some(Commands::NotifyEvents) => runner::run_notify(&config).await,
        Some(Commands::Schedule) => scheduler::run_schedule(config).await,
        None => {
            println!("yotei: use --help for available commands");
            return;
        }
    };

    if let Err(e) = result {
        error!(error = %e, "command failed");
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("yotei={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Verify jemalloc is the global allocator by advancing the epoch.
        // Only jemalloc supports this -- the system allocator would fail.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_parses_all_subcommands() {
        use clap::Parser;
        for cmd in ["fetch-messages", "analyze-messages", "notify-events", "schedule"] {
            let cli = super::Cli::try_parse_from(["yotei", cmd]);
            assert!(cli.is_ok(), "failed to parse {cmd}");
        }
    }
}
