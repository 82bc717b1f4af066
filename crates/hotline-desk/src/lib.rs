// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The support desk: question locking, moderator fan-out and chat dispatch.
//!
//! [`DeskLoop`] pulls messages from a channel adapter and hands each one to
//! the [`Dispatcher`] on its own task. Coordination between moderators goes
//! through the store's conditional updates ([`lock::QuestionLock`]); the only
//! in-process state is the per-conversation [`session::SessionStore`].

pub mod directory;
pub mod dispatch;
pub mod intake;
pub mod lock;
pub mod notify;
pub mod session;
pub mod shutdown;

use std::sync::Arc;
use std::time::Duration;

use hotline_core::{ChannelAdapter, HotlineError};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info};

pub use directory::{ModeratorDirectory, Registration};
pub use dispatch::{Dispatcher, Route, classify, parse_command};
pub use intake::{Intake, Submission};
pub use lock::{ClaimOutcome, QuestionLock};
pub use notify::{BroadcastReport, Notice, Notifier};
pub use session::{
    Conversation, MemorySessionStore, SessionGuard, SessionKey, SessionStore, UserState,
};

/// Time given to in-flight handlers after shutdown is requested.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Pause after a failed receive before polling the channel again.
const RECEIVE_BACKOFF: Duration = Duration::from_millis(500);

/// Receives chat messages and dispatches each on its own task.
pub struct DeskLoop {
    channel: Arc<dyn ChannelAdapter>,
    dispatcher: Dispatcher,
    tracker: TaskTracker,
}

impl DeskLoop {
    pub fn new(channel: Arc<dyn ChannelAdapter>, dispatcher: Dispatcher) -> Self {
        Self {
            channel,
            dispatcher,
            tracker: TaskTracker::new(),
        }
    }

    /// Runs until `cancel` fires or the channel closes, then drains handlers.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), HotlineError> {
        info!(channel = self.channel.name(), "desk loop running");

        loop {
            tokio::select! {
                msg = self.channel.receive() => {
                    match msg {
                        Ok(inbound) => {
                            let dispatcher = self.dispatcher.clone();
                            self.tracker.spawn(async move { dispatcher.handle(inbound).await });
                        }
                        Err(e) if is_closed(&e) => {
                            info!("channel closed, stopping desk loop");
                            break;
                        }
                        Err(e) => {
                            error!(error = %e, "channel receive error");
                            tokio::time::sleep(RECEIVE_BACKOFF).await;
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping desk loop");
                    break;
                }
            }
        }

        shutdown::drain_handlers(&self.tracker, DRAIN_TIMEOUT).await;
        info!("desk loop stopped");
        Ok(())
    }
}

fn is_closed(err: &HotlineError) -> bool {
    matches!(err, HotlineError::Channel { message, .. } if message.contains("closed"))
}
