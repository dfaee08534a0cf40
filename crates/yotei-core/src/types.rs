// SPDX-FileCopyrightText: 2026 Yotei Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across the gateway traits and the pipeline jobs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A raw message returned by the chat platform's history API.
///
/// `native_id` is the platform's own unique identifier for the message
/// (a Slack `ts` value) and serves as the ingestion idempotency key.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryMessage {
    pub native_id: String,
    pub author_id: Option<String>,
    pub text: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
}

/// Lifecycle status of a scheduled event.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Pending,
    Completed,
    Cancelled,
}

/// Lifecycle status of an analysis record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Pending,
    Processing,
    Success,
    Failed,
}

/// Priority of a scheduled event.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Normalize a free-text priority against the fixed allow-list.
    ///
    /// Case-insensitive matches of high/medium/low map to their canonical
    /// form; anything else (including empty input) falls back to medium.
    pub fn normalize(raw: &str) -> Priority {
        raw.trim().parse().unwrap_or(Priority::Medium)
    }
}
