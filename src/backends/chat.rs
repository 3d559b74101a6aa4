//! Chat (Slack-style webhook) backend. The minimal backend: send only.
//!
//! It still keeps a record per send, but does not expose them.

use super::transport::{SimulatedTransport, Transport};
use crate::config::ChatConfig;
use crate::core::{BackendConfig, Channel, Notifier};
use crate::error::SendError;
use crate::store::RecordStore;
use crate::types::RecordId;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub struct ChatBackend {
    name: String,
    webhook_url: String,
    channel: String,
    store: RecordStore,
    transport: Arc<dyn Transport>,
}

impl ChatBackend {
    pub fn new(config: &ChatConfig) -> Self {
        let transport = SimulatedTransport::reliable(Duration::from_millis(config.latency_ms));
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn with_transport(config: &ChatConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            name: Channel::Chat.to_string(),
            webhook_url: config.webhook_url.clone(),
            channel: config.channel.clone(),
            store: RecordStore::new(Channel::Chat),
            transport,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }

    /// The chat room messages are posted to.
    pub fn room(&self) -> &str {
        &self.channel
    }

    pub fn records(&self) -> &RecordStore {
        &self.store
    }
}

#[async_trait]
impl Notifier for ChatBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn channel(&self) -> Channel {
        Channel::Chat
    }

    async fn send(&self, destination: &str, message: &str) -> Result<RecordId, SendError> {
        info!(room = %self.channel, user = destination, "Posting chat message");
        // Chat posts are fire-and-forget: one attempt, no retry.
        let single_attempt = BackendConfig {
            max_attempts: 1,
            auto_retry: false,
            ..BackendConfig::default()
        };
        super::deliver(
            &self.store,
            self.transport.as_ref(),
            &single_attempt,
            None,
            destination,
            message,
        )
        .await
    }
}
