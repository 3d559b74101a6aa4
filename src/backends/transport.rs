//! The transport seam backends deliver through.
//!
//! Real SMTP/HTTP/SMS-gateway calls live behind [`Transport`]. The crate ships
//! only [`SimulatedTransport`], which models latency and a failure rate.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::trace;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Moves one message to one destination.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn deliver(&self, destination: &str, message: &str) -> Result<(), TransportError>;
}

/// A transport that waits `latency` and then fails with probability
/// `failure_rate`.
#[derive(Debug, Clone)]
pub struct SimulatedTransport {
    latency: Duration,
    failure_rate: f64,
    failure_reason: String,
}

impl SimulatedTransport {
    pub fn new(latency: Duration, failure_rate: f64, failure_reason: impl Into<String>) -> Self {
        Self {
            latency,
            failure_rate: failure_rate.clamp(0.0, 1.0),
            failure_reason: failure_reason.into(),
        }
    }

    /// A transport that never fails.
    pub fn reliable(latency: Duration) -> Self {
        Self::new(latency, 0.0, "")
    }

    pub fn failure_rate(&self) -> f64 {
        self.failure_rate
    }
}

#[async_trait]
impl Transport for SimulatedTransport {
    async fn deliver(&self, destination: &str, _message: &str) -> Result<(), TransportError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.failure_rate > 0.0 && rand::random::<f64>() < self.failure_rate {
            trace!(destination, "Simulated transport failure");
            return Err(TransportError(self.failure_reason.clone()));
        }
        Ok(())
    }
}
