// SPDX-FileCopyrightText: 2026 Yotei Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as value ranges and non-empty paths.

use crate::diagnostic::ConfigError;
use crate::model::YoteiConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &YoteiConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.app.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "app.log_level must be one of {}, got `{}`",
                LOG_LEVELS.join(", "),
                config.app.log_level
            ),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.slack.fetch_limit == 0 || config.slack.fetch_limit > 1000 {
        errors.push(ConfigError::Validation {
            message: format!(
                "slack.fetch_limit must be in 1..=1000, got {}",
                config.slack.fetch_limit
            ),
        });
    }

    if config.notifier.cooldown_minutes < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "notifier.cooldown_minutes must be at least 1, got {}",
                config.notifier.cooldown_minutes
            ),
        });
    }

    if !(0.0..=2.0).contains(&config.openai.temperature) {
        errors.push(ConfigError::Validation {
            message: format!(
                "openai.temperature must be in [0, 2], got {}",
                config.openai.temperature
            ),
        });
    }

    if config.slack.request_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "slack.request_timeout_secs must be at least 1".to_string(),
        });
    }

    if config.openai.request_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "openai.request_timeout_secs must be at least 1".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
