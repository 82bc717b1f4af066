// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the web support form.
//!
//! Questions posted here go through the same [`hotline_desk::Intake`] as
//! chat questions, so moderators see and claim them the same way. The
//! status endpoint lets the site poll for answers, since web submitters have
//! no chat to be answered in.

pub mod auth;
pub mod handlers;
pub mod server;
pub mod webform;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use hotline_core::{AdapterType, HealthStatus, HotlineError, PluginAdapter};

use crate::server::{GatewayState, ServerConfig};

/// The axum server as a background task with a lifecycle.
pub struct WebGateway {
    config: ServerConfig,
    state: GatewayState,
    cancel: CancellationToken,
    server_handle: Mutex<Option<JoinHandle<Result<(), HotlineError>>>>,
}

impl WebGateway {
    /// The server stops when `parent` is cancelled or on [`PluginAdapter::shutdown`].
    pub fn new(config: ServerConfig, state: GatewayState, parent: &CancellationToken) -> Self {
        Self {
            config,
            state,
            cancel: parent.child_token(),
            server_handle: Mutex::new(None),
        }
    }

    /// Spawns the server. Calling it twice is a no-op.
    pub async fn start(&self) {
        let mut handle = self.server_handle.lock().await;
        if handle.is_some() {
            return;
        }
        let config = self.config.clone();
        let state = self.state.clone();
        let cancel = self.cancel.clone();
        *handle = Some(tokio::spawn(async move {
            let result = server::start_server(&config, state, cancel).await;
            if let Err(e) = &result {
                tracing::error!(error = %e, "gateway server exited");
            }
            result
        }));
    }
}

#[async_trait]
impl PluginAdapter for WebGateway {
    fn name(&self) -> &str {
        "gateway"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Gateway
    }

    async fn health_check(&self) -> Result<HealthStatus, HotlineError> {
        let handle = self.server_handle.lock().await;
        match handle.as_ref() {
            Some(h) if !h.is_finished() => Ok(HealthStatus::Healthy),
            Some(_) => Ok(HealthStatus::Unhealthy("server exited".to_string())),
            None => Ok(HealthStatus::Unhealthy("server not started".to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), HotlineError> {
        self.cancel.cancel();
        let handle = self.server_handle.lock().await.take();
        match handle {
            Some(h) => h
                .await
                .map_err(|e| HotlineError::Internal(format!("gateway task failed: {e}")))?,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hotline_test_utils::TestHarness;

    use super::*;
    use crate::auth::AuthConfig;

    async fn gateway(harness: &TestHarness, parent: &CancellationToken) -> WebGateway {
        let state = GatewayState {
            store: Arc::clone(&harness.store),
            intake: harness.dispatcher.intake().clone(),
            upload_dir: std::env::temp_dir(),
            start_time: std::time::Instant::now(),
            service_name: "hotline".into(),
        };
        let config = ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            auth: AuthConfig::default(),
            max_body_bytes: 1024 * 1024,
        };
        WebGateway::new(config, state, parent)
    }

    #[tokio::test]
    async fn lifecycle_reports_health() {
        let harness = TestHarness::builder().build().await.unwrap();
        let parent = CancellationToken::new();
        let gw = gateway(&harness, &parent).await;

        assert_eq!(gw.adapter_type(), AdapterType::Gateway);
        assert!(matches!(
            gw.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));

        gw.start().await;
        assert_eq!(gw.health_check().await.unwrap(), HealthStatus::Healthy);

        gw.shutdown().await.unwrap();
        assert!(!parent.is_cancelled());
    }

    #[tokio::test]
    async fn parent_cancel_stops_server() {
        let harness = TestHarness::builder().build().await.unwrap();
        let parent = CancellationToken::new();
        let gw = gateway(&harness, &parent).await;
        gw.start().await;

        parent.cancel();
        gw.shutdown().await.unwrap();
        assert!(matches!(
            gw.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
    }
}
