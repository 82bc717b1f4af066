// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram channel adapter for hotline.
//!
//! Implements [`ChannelAdapter`] for the Telegram Bot API via teloxide:
//! long polling for private-chat messages, and text, photo and media-group
//! sends with reply keyboards.

pub mod handler;
pub mod media;

use std::sync::Mutex;

use async_trait::async_trait;
use hotline_config::model::TelegramConfig;
use hotline_core::{
    AdapterType, ChannelAdapter, ChannelCapabilities, HealthStatus, HotlineError, InboundMessage,
    MessageId, OutboundBody, OutboundMessage, PluginAdapter,
};
use teloxide::prelude::*;
use teloxide::types::ChatId;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Telegram channel adapter implementing [`ChannelAdapter`].
///
/// Connects via long polling and forwards private-chat messages to
/// [`ChannelAdapter::receive`]. Group messages are ignored.
pub struct TelegramChannel {
    bot: Bot,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundMessage>>,
    inbound_tx: mpsc::Sender<InboundMessage>,
    polling_handle: Mutex<Option<JoinHandle<()>>>,
}

impl TelegramChannel {
    /// Creates a new Telegram channel adapter.
    ///
    /// Requires `config.bot_token` to be set.
    pub fn new(config: &TelegramConfig) -> Result<Self, HotlineError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            HotlineError::Config("telegram.bot_token is required for Telegram adapter".into())
        })?;

        if token.is_empty() {
            return Err(HotlineError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        let (inbound_tx, inbound_rx) = mpsc::channel(100);

        Ok(Self {
            bot: Bot::new(token),
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            inbound_tx,
            polling_handle: Mutex::new(None),
        })
    }

    /// Returns a reference to the underlying teloxide Bot.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

/// Wraps a Bot API failure. Album format refusals become
/// [`HotlineError::MediaRejected`] so callers can degrade.
fn send_error(context: &str, e: teloxide::RequestError, album: bool) -> HotlineError {
    metrics::counter!("hotline_channel_send_errors_total", "channel" => "telegram").increment(1);
    let text = e.to_string();
    if album && media::is_media_rejection(&text) {
        return HotlineError::MediaRejected { message: text };
    }
    HotlineError::channel(format!("{context}: {text}"), e)
}

#[async_trait]
impl PluginAdapter for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, HotlineError> {
        // Check if the bot token is valid by calling getMe.
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), HotlineError> {
        debug!("Telegram channel shutting down");
        let handle = self
            .polling_handle
            .lock()
            .map_err(|_| HotlineError::Internal("telegram polling handle poisoned".into()))?
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for TelegramChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_albums: true,
            max_album_size: media::MAX_ALBUM_SIZE,
            max_message_length: Some(4096),
            max_caption_length: Some(media::MAX_CAPTION_LENGTH),
        }
    }

    async fn connect(&mut self) -> Result<(), HotlineError> {
        let slot = self
            .polling_handle
            .get_mut()
            .map_err(|_| HotlineError::Internal("telegram polling handle poisoned".into()))?;
        if slot.is_some() {
            return Ok(()); // Already connected
        }

        let bot = self.bot.clone();
        let tx = self.inbound_tx.clone();

        info!("starting Telegram long polling");

        let handle = tokio::spawn(async move {
            let handler = Update::filter_message().endpoint(move |msg: Message| {
                let tx = tx.clone();
                async move {
                    if !handler::is_dm(&msg) {
                        debug!(chat_id = msg.chat.id.0, "ignoring non-DM message");
                        return respond(());
                    }

                    match handler::to_inbound_message(&msg) {
                        Some(inbound) => {
                            if tx.send(inbound).await.is_err() {
                                warn!("inbound channel closed, dropping message");
                            }
                        }
                        None => {
                            debug!(msg_id = msg.id.0, "ignoring message without sender");
                        }
                    }

                    respond(())
                }
            });

            Dispatcher::builder(bot, handler)
                .default_handler(|_| async {}) // Silently ignore non-message updates
                .build()
                .dispatch()
                .await;
        });

        *slot = Some(handle);
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, HotlineError> {
        let chat = ChatId(msg.chat_id);
        let markup = msg.keyboard.as_ref().map(media::reply_markup);

        let sent_id = match msg.body {
            OutboundBody::Text(text) => {
                let mut req = self.bot.send_message(chat, text);
                if let Some(markup) = markup {
                    req = req.reply_markup(markup);
                }
                req.await
                    .map_err(|e| send_error("failed to send message", e, false))?
                    .id
            }
            OutboundBody::Photo { photo, caption } => {
                let mut req = self.bot.send_photo(chat, media::input_file(&photo));
                if let Some(caption) = caption {
                    req = req.caption(caption);
                }
                if let Some(markup) = markup {
                    req = req.reply_markup(markup);
                }
                req.await
                    .map_err(|e| send_error("failed to send photo", e, false))?
                    .id
            }
            OutboundBody::Album { photos, caption } => {
                let items = media::album(&photos, caption.as_deref());
                let sent = self
                    .bot
                    .send_media_group(chat, items)
                    .await
                    .map_err(|e| send_error("failed to send media group", e, true))?;
                sent.first().map(|m| m.id).ok_or_else(|| {
                    HotlineError::Channel {
                        message: "media group send returned no messages".into(),
                        source: None,
                    }
                })?
            }
        };

        Ok(MessageId(sent_id.0.to_string()))
    }

    async fn receive(&self) -> Result<InboundMessage, HotlineError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or_else(|| HotlineError::Channel {
            message: "Telegram inbound channel closed".into(),
            source: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(token: Option<&str>) -> TelegramConfig {
        TelegramConfig {
            bot_token: token.map(str::to_string),
            admin_ids: vec![],
        }
    }

    #[test]
    fn new_requires_bot_token() {
        assert!(TelegramChannel::new(&config(None)).is_err());
    }

    #[test]
    fn new_rejects_empty_token() {
        assert!(TelegramChannel::new(&config(Some(""))).is_err());
    }

    #[test]
    fn new_accepts_valid_token() {
        assert!(TelegramChannel::new(&config(Some("123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11"))).is_ok());
    }

    #[test]
    fn capabilities_allow_albums_of_ten() {
        let channel = TelegramChannel::new(&config(Some("test:token"))).unwrap();
        let caps = channel.capabilities();
        assert!(caps.supports_albums);
        assert_eq!(caps.max_album_size, 10);
        assert_eq!(caps.max_message_length, Some(4096));
        assert_eq!(caps.max_caption_length, Some(1024));
    }

    #[test]
    fn plugin_adapter_metadata() {
        let channel = TelegramChannel::new(&config(Some("test:token"))).unwrap();
        assert_eq!(channel.name(), "telegram");
        assert_eq!(channel.version(), semver::Version::new(0, 1, 0));
        assert_eq!(channel.adapter_type(), AdapterType::Channel);
    }

    #[tokio::test]
    async fn shutdown_before_connect_is_noop() {
        let channel = TelegramChannel::new(&config(Some("test:token"))).unwrap();
        channel.shutdown().await.unwrap();
    }
}
