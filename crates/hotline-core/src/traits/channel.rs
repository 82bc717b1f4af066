// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for chat platform integrations.

use async_trait::async_trait;

use crate::error::HotlineError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChannelCapabilities, InboundMessage, MessageId, OutboundMessage};

/// Bidirectional chat platform integration.
///
/// `receive` is called from a single loop while `send` may be called
/// concurrently from many tasks, so implementations keep their inbound
/// queue behind interior mutability.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Returns the capabilities supported by this channel.
    fn capabilities(&self) -> ChannelCapabilities;

    /// Establishes a connection to the messaging platform.
    async fn connect(&mut self) -> Result<(), HotlineError>;

    /// Sends a message. An album the platform refuses on format grounds
    /// fails with [`HotlineError::MediaRejected`].
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, HotlineError>;

    /// Receives the next inbound message from the channel.
    async fn receive(&self) -> Result<InboundMessage, HotlineError>;
}
