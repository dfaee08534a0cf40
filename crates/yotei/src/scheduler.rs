// SPDX-FileCopyrightText: 2026 Yotei Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-running scheduler driving the three jobs on cron expressions.
//!
//! Each job runs in its own task loop: sleep until the next local-time cron
//! occurrence, run, repeat. A run that overlaps the next occurrence simply
//! delays it; missed occurrences are not replayed. The analyze job
//! additionally holds a try-lock across its run so two extraction runs can
//! never race to mark the same message analyzed.

use std::future::Future;
use std::sync::Arc;

use chrono::Local;
use croner::Cron;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use yotei_config::YoteiConfig;
use yotei_core::YoteiError;

use crate::runner;

/// Run all three jobs until ctrl-c.
pub async fn run_schedule(config: YoteiConfig) -> Result<(), YoteiError> {
    let fetch_cron = parse_cron("scheduler.fetch_schedule", &config.scheduler.fetch_schedule)?;
    let analyze_cron = parse_cron(
        "scheduler.analyze_schedule",
        &config.scheduler.analyze_schedule,
    )?;
    let notify_cron = parse_cron("scheduler.notify_schedule", &config.scheduler.notify_schedule)?;

    info!(
        fetch = %config.scheduler.fetch_schedule,
        analyze = %config.scheduler.analyze_schedule,
        notify = %config.scheduler.notify_schedule,
        "scheduler started"
    );

    let config = Arc::new(config);
    let analyze_guard = Arc::new(Mutex::new(()));

    let fetch = {
        let config = config.clone();
        tokio::spawn(job_loop("fetch-messages", fetch_cron, move || {
            let config = config.clone();
            async move { runner::run_fetch(&config).await }
        }))
    };

    let analyze = {
        let config = config.clone();
        let guard = analyze_guard.clone();
        tokio::spawn(job_loop("analyze-messages", analyze_cron, move || {
            let config = config.clone();
            let guard = guard.clone();
            async move {
                // Non-overlap enforcement: a tick that fires while a previous
                // extraction run is still in flight is skipped.
                let Ok(_lock) = guard.try_lock() else {
                    warn!("previous analysis run still in flight, skipping tick");
                    return Ok(());
                };
                runner::run_analyze(&config).await
            }
        }))
    };

    let notify = {
        let config = config.clone();
        tokio::spawn(job_loop("notify-events", notify_cron, move || {
            let config = config.clone();
            async move { runner::run_notify(&config).await }
        }))
    };

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| YoteiError::Internal(format!("signal handler failed: {e}")))?;
    info!("shutdown signal received, stopping scheduler");

    fetch.abort();
    analyze.abort();
    notify.abort();
    Ok(())
}

/// Parse a cron expression, attributing errors to the config key.
fn parse_cron(key: &str, pattern: &str) -> Result<Cron, YoteiError> {
    pattern
        .parse::<Cron>()
        .map_err(|e| YoteiError::Config(format!("{key}: invalid cron expression `{pattern}`: {e}")))
}

/// Sleep-run loop for one job. Failures are logged; the loop keeps going.
async fn job_loop<F, Fut>(name: &'static str, cron: Cron, run: F)
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<(), YoteiError>>,
{
    loop {
        let next = match cron.find_next_occurrence(&Local::now(), false) {
            Ok(next) => next,
            Err(e) => {
                error!(job = name, error = %e, "no next cron occurrence, stopping loop");
                return;
            }
        };
        let wait = (next - Local::now()).to_std().unwrap_or_default();
        debug!(job = name, next = %next, "sleeping until next run");
        tokio::time::sleep(wait).await;

        if let Err(e) = run().await {
            error!(job = name, error = %e, "scheduled run failed");
        }
    }
}
