// SPDX-FileCopyrightText: 2026 Yotei Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! Timestamp columns hold UTC strings in the workspace storage format
//! (`yotei_core::time`); JSON list columns are materialized into typed
//! vectors by the query layer.

use serde::{Deserialize, Serialize};
use yotei_core::types::{AnalysisStatus, EventStatus, Priority};

/// An ingested chat message.
#[derive(Debug, Clone)]
pub struct ChannelMessage {
    pub id: i64,
    /// Platform-native message id (Slack ts), the ingestion idempotency key.
    pub slack_ts: String,
    pub channel_id: String,
    pub user_id: Option<String>,
    pub text: Option<String>,
    pub posted_at: Option<String>,
    pub analyzed_at: Option<String>,
    pub is_analyzed: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Insert/upsert payload for [`ChannelMessage`].
#[derive(Debug, Clone)]
pub struct NewChannelMessage {
    pub slack_ts: String,
    pub channel_id: String,
    pub user_id: Option<String>,
    pub text: Option<String>,
    pub posted_at: Option<String>,
}

/// One extraction attempt for one candidate found in an LLM response.
#[derive(Debug, Clone)]
pub struct EventAnalysis {
    pub id: i64,
    pub message_id: i64,
    /// Back-link to the event this analysis produced, if any.
    pub scheduled_event_id: Option<i64>,
    pub analysis_type: String,
    /// Verbatim candidate JSON, original-language keys preserved. Augmented
    /// with the error message when the analysis fails.
    pub extracted_data: String,
    pub confidence_score: f64,
    pub analysis_status: AnalysisStatus,
    pub event_start_datetime: Option<String>,
    pub event_end_datetime: Option<String>,
    pub event_title: Option<String>,
    pub event_type: Option<String>,
    pub created_at: String,
}

/// Insert payload for [`EventAnalysis`].
#[derive(Debug, Clone)]
pub struct NewEventAnalysis {
    pub message_id: i64,
    pub extracted_data: String,
    pub confidence_score: f64,
    pub analysis_status: AnalysisStatus,
    pub event_start_datetime: Option<String>,
    pub event_end_datetime: Option<String>,
    pub event_title: Option<String>,
    pub event_type: Option<String>,
}

/// One delivered notification for a scheduled event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEntry {
    pub notified_at: String,
    pub recipient: String,
}

/// A schedule event extracted from a message.
#[derive(Debug, Clone)]
pub struct ScheduledEvent {
    pub id: i64,
    pub message_id: i64,
    pub event_type: String,
    pub title: String,
    pub description: Option<String>,
    /// Always present and parseable on a persisted event.
    pub start_datetime: String,
    pub end_datetime: Option<String>,
    pub location: Option<String>,
    pub participants: Vec<String>,
    pub status: EventStatus,
    pub priority: Priority,
    pub is_notification_enabled: bool,
    pub last_notified_at: Option<String>,
    pub notification_history: Vec<NotificationEntry>,
    pub created_at: String,
    pub updated_at: String,
}

/// Insert payload for [`ScheduledEvent`].
#[derive(Debug, Clone)]
pub struct NewScheduledEvent {
    pub message_id: i64,
    pub event_type: String,
    pub title: String,
    pub description: Option<String>,
    pub start_datetime: String,
    pub end_datetime: Option<String>,
    pub location: Option<String>,
    pub participants: Vec<String>,
    pub status: EventStatus,
    pub priority: Priority,
}
