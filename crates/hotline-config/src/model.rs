// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the hotline service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level hotline configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HotlineConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Telegram bot integration settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Question intake limits.
    #[serde(default)]
    pub intake: IntakeConfig,

    /// Web form HTTP gateway.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl HotlineConfig {
    /// Copy with secrets replaced, for printing.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.telegram.bot_token.is_some() {
            copy.telegram.bot_token = Some(REDACTED.to_string());
        }
        if copy.gateway.bearer_token.is_some() {
            copy.gateway.bearer_token = Some(REDACTED.to_string());
        }
        copy
    }
}

const REDACTED: &str = "[redacted]";

/// Service identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name used in logs and the gateway root route.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "hotline".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telegram bot integration configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. `None` disables Telegram integration.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Telegram user ids allowed to register themselves as moderators.
    #[serde(default)]
    pub admin_ids: Vec<i64>,
}

/// SQLite storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    "hotline.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Limits applied while a question is being collected.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IntakeConfig {
    /// Photos kept per question; extra photos are ignored.
    #[serde(default = "default_max_photos")]
    pub max_photos_per_question: usize,

    /// Directory that receives images uploaded through the web form.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            max_photos_per_question: default_max_photos(),
            upload_dir: default_upload_dir(),
        }
    }
}

fn default_max_photos() -> usize {
    3
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Serve the web form API.
    #[serde(default = "default_gateway_enabled")]
    pub enabled: bool,

    /// Bind host.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// When set, `/api/*` requests must carry `Authorization: Bearer <token>`.
    #[serde(default)]
    pub bearer_token: Option<String>,

    /// Largest accepted request body in bytes. Web form images arrive as
    /// base64 data URLs inside the JSON body.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: default_gateway_enabled(),
            host: default_gateway_host(),
            port: default_gateway_port(),
            bearer_token: None,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_gateway_enabled() -> bool {
    true
}

fn default_gateway_host() -> String {
    "0.0.0.0".to_string()
}

fn default_gateway_port() -> u16 {
    8000
}

fn default_max_body_bytes() -> usize {
    32 * 1024 * 1024
}
