// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./hotline.toml` > `~/.config/hotline/hotline.toml` > `/etc/hotline/hotline.toml`
//! with environment variable overrides via the `HOTLINE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::HotlineConfig;

/// Top-level sections an env var can address.
const SECTIONS: &[&str] = &["service", "telegram", "storage", "intake", "gateway"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/hotline/hotline.toml`
/// 3. `~/.config/hotline/hotline.toml`
/// 4. `./hotline.toml`
/// 5. `HOTLINE_*` environment variables
pub fn load_config() -> Result<HotlineConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<HotlineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HotlineConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<HotlineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HotlineConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The full layered Figment before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(HotlineConfig::default()))
        .merge(Toml::file("/etc/hotline/hotline.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("hotline/hotline.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("hotline.toml"))
        .merge(env_provider())
}

/// Env provider mapping `HOTLINE_<SECTION>_<KEY>` to `<section>.<key>`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `HOTLINE_TELEGRAM_BOT_TOKEN` maps to `telegram.bot_token`.
fn env_provider() -> Env {
    Env::prefixed("HOTLINE_").map(|key| map_env_key(&key.as_str().to_ascii_lowercase()).into())
}

/// Maps a lowercased, prefix-stripped env key onto a dotted config path.
pub fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section) {
            if let Some(field) = rest.strip_prefix('_') {
                return format!("{section}.{field}");
            }
        }
    }
    key.to_string()
}
