// SPDX-FileCopyrightText: 2026 Yotei Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat platform gateway trait.

use async_trait::async_trait;

use crate::error::YoteiError;
use crate::types::HistoryMessage;

/// Gateway to the remote chat platform (Slack in production).
///
/// Platform-level `ok: false` responses surface as `YoteiError::Channel`
/// carrying the platform's error code; transport failures carry the
/// underlying source error.
#[async_trait]
pub trait ChannelGateway: Send + Sync {
    /// Fetch up to `limit` most recent messages from a channel's history.
    async fn fetch_history(
        &self,
        channel_id: &str,
        limit: u32,
    ) -> Result<Vec<HistoryMessage>, YoteiError>;

    /// Post a plain-text message to a channel.
    async fn post_message(&self, channel_id: &str, text: &str) -> Result<(), YoteiError>;

    /// Resolve a user id to a human-readable display name.
    async fn resolve_user_name(&self, user_id: &str) -> Result<String, YoteiError>;

    /// Open (or reuse) a direct-message channel with a user, returning its id.
    async fn open_direct_message(&self, user_id: &str) -> Result<String, YoteiError>;

    /// Check that a channel id exists and is visible to the bot.
    async fn validate_channel(&self, channel_id: &str) -> Result<(), YoteiError>;

    /// Check that the configured bot credential is accepted by the platform.
    async fn test_credential(&self) -> Result<(), YoteiError>;
}
