// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as bind hosts, non-empty paths and the photo cap range.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::HotlineConfig;

/// Allowed range for `intake.max_photos_per_question`.
pub const PHOTO_CAP_RANGE: std::ops::RangeInclusive<usize> = 1..=10;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &HotlineConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.service.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "service.log_level `{}` must be one of {}",
                config.service.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if !PHOTO_CAP_RANGE.contains(&config.intake.max_photos_per_question) {
        errors.push(ConfigError::Validation {
            message: format!(
                "intake.max_photos_per_question must be between {} and {}, got {}",
                PHOTO_CAP_RANGE.start(),
                PHOTO_CAP_RANGE.end(),
                config.intake.max_photos_per_question
            ),
        });
    }

    let mut seen = HashSet::new();
    for id in &config.telegram.admin_ids {
        if *id <= 0 {
            errors.push(ConfigError::Validation {
                message: format!("telegram.admin_ids must be positive user ids, got {id}"),
            });
        } else if !seen.insert(*id) {
            errors.push(ConfigError::Validation {
                message: format!("duplicate id {id} in telegram.admin_ids"),
            });
        }
    }

    if let Some(token) = &config.telegram.bot_token {
        if token.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: "telegram.bot_token must not be empty when set".to_string(),
            });
        }
    }

    if config.gateway.enabled {
        let host = config.gateway.host.trim();
        if host.is_empty() {
            errors.push(ConfigError::Validation {
                message: "gateway.host must not be empty".to_string(),
            });
        } else {
            let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
            let is_valid_hostname = host
                .chars()
                .all(|c| c.is_alphanumeric() || c == '.' || c == '-');
            if !is_valid_ip && !is_valid_hostname {
                errors.push(ConfigError::Validation {
                    message: format!("gateway.host `{host}` is not a valid IP address or hostname"),
                });
            }
        }

        if config.gateway.port == 0 {
            errors.push(ConfigError::Validation {
                message: "gateway.port must not be 0 when the gateway is enabled".to_string(),
            });
        }

        if config.gateway.max_body_bytes < 64 * 1024 {
            errors.push(ConfigError::Validation {
                message: format!(
                    "gateway.max_body_bytes must be at least 65536, got {}",
                    config.gateway.max_body_bytes
                ),
            });
        }

        if config.intake.upload_dir.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: "intake.upload_dir must not be empty when the gateway is enabled"
                    .to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
