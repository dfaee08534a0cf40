// SPDX-FileCopyrightText: 2026 Yotei Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ingestion job: pull recent channel history and upsert it.
//!
//! The platform-native message id is the idempotency key, so re-fetching an
//! unchanged history is a no-op and the job is safe to retry after a
//! transport failure. Analysis state is never touched here.

use tracing::info;
use yotei_core::{ChannelGateway, YoteiError, time};
use yotei_storage::models::NewChannelMessage;
use yotei_storage::{Database, queries};

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub fetched: usize,
    pub saved: usize,
}

/// Fetch up to `limit` messages from `channel_id` and upsert each one.
///
/// A transport or auth failure aborts the run; upserts already committed
/// stand, and the next run absorbs them silently.
pub async fn run(
    gateway: &dyn ChannelGateway,
    db: &Database,
    channel_id: &str,
    limit: u32,
) -> Result<IngestSummary, YoteiError> {
    let messages = gateway.fetch_history(channel_id, limit).await?;

    if messages.is_empty() {
        info!(channel_id, "no new messages in channel history");
        return Ok(IngestSummary::default());
    }

    let mut saved = 0;
    for message in &messages {
        let new_message = NewChannelMessage {
            slack_ts: message.native_id.clone(),
            channel_id: channel_id.to_string(),
            user_id: message.author_id.clone(),
            text: message.text.clone(),
            posted_at: message.posted_at.map(time::format_utc),
        };
        queries::messages::upsert_message(db, &new_message).await?;
        saved += 1;
    }

    info!(
        channel_id,
        fetched = messages.len(),
        saved,
        "channel history saved to database"
    );
    Ok(IngestSummary {
        fetched: messages.len(),
        saved,
    })
}
