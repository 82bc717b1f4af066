// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `hotline check`: print the effective configuration with secrets redacted.

use hotline_config::HotlineConfig;
use hotline_core::HotlineError;

/// Renders the redacted configuration followed by a one-line summary of
/// which surfaces `serve` would start.
pub fn render(config: &HotlineConfig) -> Result<String, HotlineError> {
    let toml = toml::to_string_pretty(&config.redacted())
        .map_err(|e| HotlineError::Internal(format!("cannot render config: {e}")))?;

    let telegram = if config.telegram.bot_token.is_some() {
        "telegram: enabled"
    } else {
        "telegram: disabled (no bot token)"
    };
    let gateway = if config.gateway.enabled {
        format!(
            "gateway: {}:{}",
            config.gateway.host, config.gateway.port
        )
    } else {
        "gateway: disabled".to_string()
    };

    Ok(format!("{toml}\n# {telegram}; {gateway}\n"))
}

pub fn run_check(config: &HotlineConfig) -> Result<(), HotlineError> {
    print!("{}", render(config)?);
    println!("configuration OK");
    Ok(())
}
