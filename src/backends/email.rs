//! Email delivery backend.
//!
//! Implements every capability: send, validation, tracking and logging. It is
//! also the usual choice for the dispatcher's shared logger.

use super::transport::{SimulatedTransport, Transport};
use crate::config::EmailConfig;
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

pub struct EmailBackend {
    name: String,
    smtp_host: String,
    smtp_port: u16,
    username: String,
    max_message_len: usize,
    delivery: BackendConfig,
    store: RecordStore,
    transport: Arc<dyn Transport>,
    logger: TracingLogger,
}

impl EmailBackend {
    /// Creates an email backend that delivers through a simulated SMTP server.
    pub fn new(config: &EmailConfig) -> Self {
        let transport = SimulatedTransport::new(
            Duration::from_millis(config.latency_ms),
            config.failure_rate,
            "SMTP server unavailable",
        );
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn with_transport(config: &EmailConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            name: Channel::Email.to_string(),
            smtp_host: config.smtp_host.clone(),
            smtp_port: config.smtp_port,
            username: config.username.clone(),
            max_message_len: config.max_message_len,
            delivery: config.delivery,
            store: RecordStore::new(Channel::Email),
            transport,
            logger: TracingLogger::new("email"),
        }
    }

    /// Overrides the backend name used as its dispatch key.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The SMTP server as `host:port`.
    pub fn server(&self) -> String {
        format!("{}:{}", self.smtp_host, self.smtp_port)
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn records(&self) -> &RecordStore {
        &self.store
    }
}

#[async_trait]
impl Notifier for EmailBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn channel(&self) -> Channel {
        Channel::Email
    }

    #[instrument(skip(self, message), fields(backend = %self.name))]
    async fn send(&self, destination: &str, message: &str) -> Result<RecordId, SendError> {
        if let Err(e) = super::check_input(self, Channel::Email, destination, message) {
            self.log_error(&e);
            return Err(e);
        }
        self.log_info(&format!("Sending email to {} via {}", destination, self.server()));
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

impl MessageValidator for EmailBackend {
    fn validate_message(&self, message: &str) -> Result<(), ValidationError> {
        super::check_length(message, self.max_message_len)
    }

    fn validate_destination(&self, destination: &str) -> Result<(), ValidationError> {
        if !destination.contains('@') {
            return Err(ValidationError::invalid_destination(
                "email address must contain '@'",
            ));
        }
        if !destination.contains('.') {
            return Err(ValidationError::invalid_destination(
                "email address must contain a domain",
            ));
        }
        Ok(())
    }
}

impl DeliveryTracker for EmailBackend {
    fn status(&self, id: &str) -> Result<DeliveryState, NotFoundError> {
        self.store.state(id)
    }

    fn statistics(&self) -> Statistics {
        self.store.statistics()
    }
}

impl Logger for EmailBackend {
    fn log(&self, level: Level, message: &str) {
        self.logger.log(level, message);
    }
}
