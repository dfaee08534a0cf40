// SPDX-FileCopyrightText: 2026 Yotei Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./yotei.toml` > `~/.config/yotei/yotei.toml` >
//! `/etc/yotei/yotei.toml` with environment variable overrides via the
//! `YOTEI_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::YoteiConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/yotei/yotei.toml` (system-wide)
/// 3. `~/.config/yotei/yotei.toml` (user XDG config)
/// 4. `./yotei.toml` (local directory)
/// 5. `YOTEI_*` environment variables
pub fn load_config() -> Result<YoteiConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(YoteiConfig::default()))
        .merge(Toml::file("/etc/yotei/yotei.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("yotei/yotei.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("yotei.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<YoteiConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(YoteiConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<YoteiConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(YoteiConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `YOTEI_SLACK_NOTIFICATION_CHANNEL_ID`
/// must map to `slack.notification_channel_id`, not `slack.notification.channel.id`.
fn env_provider() -> Env {
    Env::prefixed("YOTEI_").map(|key| {
        // `key` is the lowercased env var name with the prefix stripped.
        // Example: YOTEI_SLACK_BOT_TOKEN -> "slack_bot_token"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("app_", "app.", 1)
            .replacen("slack_", "slack.", 1)
            .replacen("openai_", "openai.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("notifier_", "notifier.", 1)
            .replacen("scheduler_", "scheduler.", 1);
        mapped.into()
    })
}
