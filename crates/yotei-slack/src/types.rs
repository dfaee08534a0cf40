// SPDX-FileCopyrightText: 2026 Yotei Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serde types for the subset of the Slack Web API this crate consumes.
//!
//! Every Slack response carries the `{ok, error?}` envelope; API-level
//! failures arrive as HTTP 200 with `ok: false`.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Response for `conversations.history`.
#[derive(Debug, Deserialize)]
pub struct HistoryResponse {
    pub ok: bool,
    pub error: Option<String>,
    #[serde(default)]
    pub messages: Vec<HistoryItem>,
}

/// One raw message in a `conversations.history` response.
#[derive(Debug, Deserialize)]
pub struct HistoryItem {
    /// Slack's message id: epoch seconds with a disambiguating suffix.
    pub ts: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// Response for `auth.test`.
#[derive(Debug, Deserialize)]
pub struct AuthTestResponse {
    pub ok: bool,
    pub error: Option<String>,
}

/// Response for `users.info`.
#[derive(Debug, Deserialize)]
pub struct UsersInfoResponse {
    pub ok: bool,
    pub error: Option<String>,
    pub user: Option<UserInfo>,
}

#[derive(Debug, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub profile: Option<UserProfile>,
}

#[derive(Debug, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub real_name: Option<String>,
}

/// Response for `conversations.open`.
#[derive(Debug, Deserialize)]
pub struct ConversationsOpenResponse {
    pub ok: bool,
    pub error: Option<String>,
    pub channel: Option<ChannelRef>,
}

#[derive(Debug, Deserialize)]
pub struct ChannelRef {
    pub id: String,
}

/// Response for `conversations.info`.
#[derive(Debug, Deserialize)]
pub struct ConversationsInfoResponse {
    pub ok: bool,
    pub error: Option<String>,
}

/// Response for `chat.postMessage`.
#[derive(Debug, Deserialize)]
pub struct PostMessageResponse {
    pub ok: bool,
    pub error: Option<String>,
}

/// Convert a Slack `ts` value ("1715212800.000100") to a UTC timestamp.
pub fn ts_to_datetime(ts: &str) -> Option<DateTime<Utc>> {
    let (secs, frac) = match ts.split_once('.') {
        Some((s, f)) => (s, f),
        None => (ts, ""),
    };
    let secs: i64 = secs.parse().ok()?;
    let nanos: u32 = if frac.is_empty() {
        0
    } else {
        // Right-pad to nanosecond precision; ts fractions are microseconds.
        let padded = format!("{frac:0<9}");
        padded.get(..9)?.parse().ok()?
    };
    DateTime::from_timestamp(secs, nanos)
}
