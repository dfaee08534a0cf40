// SPDX-FileCopyrightText: 2026 Yotei Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Job wiring: build validated client handles from configuration and inject
//! them into the pipeline jobs.

use std::time::Duration;

use tracing::info;
use yotei_config::YoteiConfig;
use yotei_core::YoteiError;
use yotei_openai::OpenAiProvider;
use yotei_pipeline::{extract, ingest, notify};
use yotei_slack::SlackClient;
use yotei_storage::Database;

/// Build the Slack gateway from configuration.
fn build_gateway(config: &YoteiConfig) -> Result<SlackClient, YoteiError> {
    let token = config
        .slack
        .bot_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| YoteiError::Config("slack.bot_token is not set".to_string()))?;
    SlackClient::new(token, Duration::from_secs(config.slack.request_timeout_secs))
}

fn require(value: &Option<String>, key: &str) -> Result<String, YoteiError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| YoteiError::Config(format!("{key} is not set")))
}

/// Run the ingestion job once.
pub async fn run_fetch(config: &YoteiConfig) -> Result<(), YoteiError> {
    let gateway = build_gateway(config)?;
    let channel_id = require(&config.slack.channel_id, "slack.channel_id")?;
    let db = Database::open(&config.storage.database_path).await?;

    let summary = ingest::run(&gateway, &db, &channel_id, config.slack.fetch_limit).await?;
    info!(
        fetched = summary.fetched,
        saved = summary.saved,
        "fetch-messages finished"
    );
    db.close().await
}

/// Run the extraction job once.
pub async fn run_analyze(config: &YoteiConfig) -> Result<(), YoteiError> {
    let provider = OpenAiProvider::new(&config.openai)?;
    let db = Database::open(&config.storage.database_path).await?;

    let summary = extract::run(&provider, &db).await?;
    info!(
        messages = summary.messages_processed,
        analyses = summary.analyses_created,
        events = summary.events_created,
        failures = summary.failed_candidates,
        "analyze-messages finished"
    );
    db.close().await
}

/// Run the notification job once.
pub async fn run_notify(config: &YoteiConfig) -> Result<(), YoteiError> {
    let gateway = build_gateway(config)?;
    let channel_id = require(
        &config.slack.notification_channel_id,
        "slack.notification_channel_id",
    )?;
    let db = Database::open(&config.storage.database_path).await?;

    let summary = notify::run(
        &gateway,
        &db,
        &channel_id,
        config.notifier.cooldown_minutes,
    )
    .await?;
    info!(
        candidates = summary.candidates,
        delivered = summary.delivered,
        updated = summary.updated,
        "notify-events finished"
    );
    db.close().await
}
