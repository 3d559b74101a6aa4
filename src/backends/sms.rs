//! SMS delivery backend. Implements every capability.

use super::transport::{SimulatedTransport, Transport};
use crate::config::SmsConfig;
use crate::core::{
    BackendConfig, Channel, DeliveryState, DeliveryTracker, Logger, MessageValidator, Notifier,
};
use crate::error::{NotFoundError, SendError, ValidationError};
use crate::logging::TracingLogger;
use crate::store::RecordStore;
use crate::types::{RecordId, Statistics};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{instrument, Level};

pub struct SmsBackend {
    name: String,
    provider: String,
    max_message_len: usize,
    min_destination_len: usize,
    delivery: BackendConfig,
    store: RecordStore,
    transport: Arc<dyn Transport>,
    logger: TracingLogger,
}

impl SmsBackend {
    pub fn new(config: &SmsConfig) -> Self {
        let transport = SimulatedTransport::new(
            Duration::from_millis(config.latency_ms),
            config.failure_rate,
            "number not reachable",
        );
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn with_transport(config: &SmsConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            name: Channel::Sms.to_string(),
            provider: config.provider.clone(),
            max_message_len: config.max_message_len,
            min_destination_len: config.min_destination_len,
            delivery: config.delivery,
            store: RecordStore::new(Channel::Sms),
            transport,
            logger: TracingLogger::new("sms"),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn records(&self) -> &RecordStore {
        &self.store
    }
}

#[async_trait]
impl Notifier for SmsBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn channel(&self) -> Channel {
        Channel::Sms
    }

    #[instrument(skip(self, message), fields(backend = %self.name))]
    async fn send(&self, destination: &str, message: &str) -> Result<RecordId, SendError> {
        if let Err(e) = super::check_input(self, Channel::Sms, destination, message) {
            self.log_error(&e);
            return Err(e);
        }
        self.log_info(&format!("Sending SMS to {} via {}", destination, self.provider));
        super::deliver(
            &self.store,
            self.transport.as_ref(),
            &self.delivery,
            Some(self),
            destination,
            message,
        )
        .await
    }

    fn as_validator(&self) -> Option<&dyn MessageValidator> {
        Some(self)
    }

    fn as_tracker(&self) -> Option<&dyn DeliveryTracker> {
        Some(self)
    }

    fn as_logger(&self) -> Option<&dyn Logger> {
        Some(self)
    }
}

impl MessageValidator for SmsBackend {
    fn validate_message(&self, message: &str) -> Result<(), ValidationError> {
        super::check_length(message, self.max_message_len)
    }

    fn validate_destination(&self, destination: &str) -> Result<(), ValidationError> {
        if destination.chars().count() < self.min_destination_len {
            return Err(ValidationError::invalid_destination(format!(
                "phone number too short (minimum {} characters)",
                self.min_destination_len
            )));
        }
        if !destination.starts_with('+') && !destination.starts_with('0') {
            return Err(ValidationError::invalid_destination(
                "phone number must start with '+' or '0'",
            ));
        }
        Ok(())
    }
}

impl DeliveryTracker for SmsBackend {
    fn status(&self, id: &str) -> Result<DeliveryState, NotFoundError> {
        self.store.state(id)
    }

    fn statistics(&self) -> Statistics {
        self.store.statistics()
    }
}

impl Logger for SmsBackend {
    fn log(&self, level: Level, message: &str) {
        self.logger.log(level, message);
    }
}
