// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `hotline serve` command implementation.
//!
//! Opens the question store, connects the Telegram bot, starts the web
//! gateway when enabled, and runs the desk loop until SIGINT/SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use hotline_config::model::HotlineConfig;
use hotline_core::{ChannelAdapter, HotlineError, PluginAdapter, StorageAdapter};
use hotline_desk::{DeskLoop, Dispatcher, MemorySessionStore, ModeratorDirectory, shutdown};
use hotline_gateway::WebGateway;
use hotline_gateway::server::{GatewayState, ServerConfig};
use hotline_storage::SqliteStorage;
use hotline_telegram::TelegramChannel;
use tracing::{info, warn};

/// Runs the `hotline serve` command.
///
/// A Telegram bot token is required: moderators are reached through the bot
/// even for questions that arrive through the web form.
pub async fn run_serve(config: HotlineConfig) -> Result<(), HotlineError> {
    init_tracing(&config.service.log_level);

    info!(service = %config.service.name, "starting hotline serve");

    let mut telegram = TelegramChannel::new(&config.telegram).map_err(|e| {
        eprintln!(
            "error: Telegram bot token required. Set telegram.bot_token or HOTLINE_TELEGRAM_BOT_TOKEN."
        );
        e
    })?;

    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let store: Arc<dyn StorageAdapter> = Arc::new(storage);

    if config.telegram.admin_ids.is_empty() {
        warn!("telegram.admin_ids is empty; nobody can register as a moderator");
    }

    telegram.connect().await?;
    let channel: Arc<dyn ChannelAdapter> = Arc::new(telegram);
    info!("telegram channel connected");

    let directory = ModeratorDirectory::new(store.clone(), config.telegram.admin_ids.clone());
    let dispatcher = Dispatcher::new(
        store.clone(),
        channel.clone(),
        Arc::new(MemorySessionStore::new()),
        directory,
        config.intake.max_photos_per_question,
    );

    let cancel = shutdown::install_signal_handler();

    let gateway = if config.gateway.enabled {
        let state = GatewayState {
            store: store.clone(),
            intake: dispatcher.intake().clone(),
            upload_dir: PathBuf::from(&config.intake.upload_dir),
            start_time: std::time::Instant::now(),
            service_name: config.service.name.clone(),
        };
        let gateway = WebGateway::new(ServerConfig::from(&config.gateway), state, &cancel);
        gateway.start().await;
        Some(gateway)
    } else {
        info!("gateway disabled by configuration");
        None
    };

    let desk = DeskLoop::new(channel.clone(), dispatcher);
    let result = desk.run(cancel.clone()).await;

    // The loop can also end because the channel closed; stop the rest too.
    cancel.cancel();

    if let Some(gateway) = gateway {
        if let Err(e) = gateway.shutdown().await {
            warn!(error = %e, "gateway shutdown failed");
        }
    }
    if let Err(e) = channel.shutdown().await {
        warn!(error = %e, "telegram shutdown failed");
    }
    store.close().await?;

    result?;
    info!("hotline serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("hotline={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
