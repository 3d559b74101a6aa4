//! Push notification backend. Implements send and tracking only.

use super::transport::{SimulatedTransport, Transport};
use crate::config::PushConfig;
use crate::core::{BackendConfig, Channel, DeliveryState, DeliveryTracker, Notifier};
use crate::error::{NotFoundError, SendError};
use crate::store::RecordStore;
use crate::types::{RecordId, Statistics};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub struct PushBackend {
    name: String,
    app_id: String,
    delivery: BackendConfig,
    store: RecordStore,
    transport: Arc<dyn Transport>,
}

impl PushBackend {
    pub fn new(config: &PushConfig) -> Self {
        let transport = SimulatedTransport::new(
            Duration::from_millis(config.latency_ms),
            config.failure_rate,
            "device token rejected",
        );
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn with_transport(config: &PushConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            name: Channel::Push.to_string(),
            app_id: config.app_id.clone(),
            delivery: config.delivery,
            store: RecordStore::new(Channel::Push),
            transport,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn records(&self) -> &RecordStore {
        &self.store
    }
}

#[async_trait]
impl Notifier for PushBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn channel(&self) -> Channel {
        Channel::Push
    }

    async fn send(&self, destination: &str, message: &str) -> Result<RecordId, SendError> {
        debug!(app_id = %self.app_id, destination, "Sending push notification");
        super::deliver(
            &self.store,
            self.transport.as_ref(),
            &self.delivery,
            None,
            destination,
            message,
        )
        .await
    }

    fn as_tracker(&self) -> Option<&dyn DeliveryTracker> {
        Some(self)
    }
}

impl DeliveryTracker for PushBackend {
    fn status(&self, id: &str) -> Result<DeliveryState, NotFoundError> {
        self.store.state(id)
    }

    fn statistics(&self) -> Statistics {
        self.store.statistics()
    }
}
