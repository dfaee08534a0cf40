// SPDX-FileCopyrightText: 2026 Yotei Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the yotei pipeline.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level yotei configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values; required credentials are checked when the jobs that need them run.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct YoteiConfig {
    /// Process-wide settings.
    #[serde(default)]
    pub app: AppConfig,

    /// Slack workspace integration settings.
    #[serde(default)]
    pub slack: SlackConfig,

    /// OpenAI API settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Notification behavior settings.
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Cron schedules for the `schedule` command.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Process-wide configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Slack workspace integration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SlackConfig {
    /// Slack bot token. `None` disables every Slack-touching job.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Channel whose history is ingested.
    #[serde(default)]
    pub channel_id: Option<String>,

    /// Channel that receives batched event notifications.
    #[serde(default)]
    pub notification_channel_id: Option<String>,

    /// Maximum messages fetched per ingestion run.
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: u32,

    /// Request timeout for Slack API calls, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            channel_id: None,
            notification_channel_id: None,
            fetch_limit: default_fetch_limit(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_fetch_limit() -> u32 {
    100
}

fn default_request_timeout_secs() -> u64 {
    60
}

/// OpenAI API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// OpenAI API key. `None` requires the `OPENAI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Chat model used for event extraction.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature for extraction requests.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout for OpenAI API calls, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    "gpt-4".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("yotei").join("yotei.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("yotei.db"))
        .to_string_lossy()
        .into_owned()
}

/// Notification behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NotifierConfig {
    /// Minimum minutes between notifications for the same event.
    #[serde(default = "default_cooldown_minutes")]
    pub cooldown_minutes: i64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            cooldown_minutes: default_cooldown_minutes(),
        }
    }
}

fn default_cooldown_minutes() -> i64 {
    30
}

/// Cron schedules driving the `schedule` command, in local time.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Schedule for the ingestion job.
    #[serde(default = "default_fetch_schedule")]
    pub fetch_schedule: String,

    /// Schedule for the extraction job.
    #[serde(default = "default_analyze_schedule")]
    pub analyze_schedule: String,

    /// Schedule for the notification job.
    #[serde(default = "default_notify_schedule")]
    pub notify_schedule: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            fetch_schedule: default_fetch_schedule(),
            analyze_schedule: default_analyze_schedule(),
            notify_schedule: default_notify_schedule(),
        }
    }
}

fn default_fetch_schedule() -> String {
    "*/5 * * * *".to_string()
}

fn default_analyze_schedule() -> String {
    "0 9,21 * * *".to_string()
}

fn default_notify_schedule() -> String {
    "*/30 * * * *".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_production_schedule() {
        let config = YoteiConfig::default();
        assert_eq!(config.slack.fetch_limit, 100);
        assert_eq!(config.notifier.cooldown_minutes, 30);
        assert_eq!(config.openai.model, "gpt-4");
        assert_eq!(config.scheduler.fetch_schedule, "*/5 * * * *");
        assert_eq!(config.scheduler.analyze_schedule, "0 9,21 * * *");
        assert_eq!(config.scheduler.notify_schedule, "*/30 * * * *");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let toml_str = r#"
[slack]
bot_tken = "xoxb-123"
"#;
        assert!(toml::from_str::<YoteiConfig>(toml_str).is_err());
    }
}
