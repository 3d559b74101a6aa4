//! Core domain types and capability traits for notifyhub
//!
//! This module defines the delivery record data model and the trait contracts
//! that every delivery backend is built from. Sending is the only mandatory
//! capability; validation, tracking and logging are optional and are reached
//! through the `as_*` accessors on [`Notifier`], which default to `None`.

use crate::error::{NotFoundError, SendError, TransitionError, ValidationError};
use crate::types::{RecordId, Statistics};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::Level;

/// The delivery channel a backend serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Sms,
    Push,
    Chat,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Sms => "sms",
            Channel::Push => "push",
            Channel::Chat => "chat",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a delivery record.
///
/// Allowed transitions are `Pending -> Sent`, `Pending -> Failed` and
/// `Sent -> Delivered`. `Delivered` is reserved for asynchronous delivery
/// confirmation and is never reached by a synchronous send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryState {
    #[default]
    Pending,
    Sent,
    Failed,
    Delivered,
}

impl DeliveryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryState::Pending => "pending",
            DeliveryState::Sent => "sent",
            DeliveryState::Failed => "failed",
            DeliveryState::Delivered => "delivered",
        }
    }

    /// Returns `true` if a record in this state may move to `next`.
    pub fn can_transition_to(self, next: DeliveryState) -> bool {
        matches!(
            (self, next),
            (DeliveryState::Pending, DeliveryState::Sent)
                | (DeliveryState::Pending, DeliveryState::Failed)
                | (DeliveryState::Sent, DeliveryState::Delivered)
        )
    }
}

impl fmt::Display for DeliveryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The record of a single delivery attempt.
///
/// Identity, content and creation time are fixed when the record is created.
/// Only the state, the attempt counter and the last error change afterwards,
/// and only through the owning [`RecordStore`](crate::store::RecordStore).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryRecord {
    id: RecordId,
    channel: Channel,
    destination: String,
    message: String,
    state: DeliveryState,
    created_at: DateTime<Utc>,
    attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_error: Option<String>,
}

impl DeliveryRecord {
    pub(crate) fn new(
        id: RecordId,
        channel: Channel,
        destination: &str,
        message: &str,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            channel,
            destination: destination.to_string(),
            message: message.to_string(),
            state: DeliveryState::Pending,
            created_at,
            attempts: 1,
            last_error: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn state(&self) -> DeliveryState {
        self.state
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The failure reason. Only set while the record is `Failed`.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub(crate) fn transition(
        &mut self,
        next: DeliveryState,
        error: Option<String>,
    ) -> Result<(), TransitionError> {
        if !self.state.can_transition_to(next) {
            return Err(TransitionError {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        self.last_error = match next {
            DeliveryState::Failed => error,
            _ => None,
        };
        Ok(())
    }

    pub(crate) fn bump_attempts(&mut self) -> u32 {
        self.attempts += 1;
        self.attempts
    }
}

/// Per-backend delivery settings.
///
/// These are private to the backend that owns them; the dispatcher never
/// reads them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Upper bound on transport attempts within a single send.
    pub max_attempts: u32,
    /// Upper bound on a single transport attempt, in milliseconds.
    pub timeout_ms: u64,
    /// Retry failed attempts immediately, up to `max_attempts`.
    pub auto_retry: bool,
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Number of transport attempts a single send may make.
    pub fn attempt_budget(&self) -> u32 {
        if self.auto_retry {
            self.max_attempts.max(1)
        } else {
            1
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout_ms: 30_000,
            auto_retry: true,
        }
    }
}

// =============================================================================
// Capability Traits
// =============================================================================

/// The mandatory send capability every delivery backend implements.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// A stable, descriptive name for the backend (e.g. "email", "sms").
    /// Used for logging, metrics and as the base of dispatch result keys.
    fn name(&self) -> &str;

    /// The channel this backend delivers over.
    fn channel(&self) -> Channel;

    /// Performs exactly one delivery.
    ///
    /// Creates exactly one delivery record, which ends up `Sent` or `Failed`.
    ///
    /// # Returns
    /// * `Ok(RecordId)` of the record when the message was sent
    /// * `Err(SendError)` carrying the record id and a displayable reason otherwise
    async fn send(&self, destination: &str, message: &str) -> Result<RecordId, SendError>;

    /// The validation capability, if this backend has one.
    fn as_validator(&self) -> Option<&dyn MessageValidator> {
        None
    }

    /// The tracking capability, if this backend has one.
    fn as_tracker(&self) -> Option<&dyn DeliveryTracker> {
        None
    }

    /// The logging capability, if this backend has one.
    fn as_logger(&self) -> Option<&dyn Logger> {
        None
    }
}

/// Backend-specific checks run before a send.
pub trait MessageValidator: Send + Sync {
    fn validate_message(&self, message: &str) -> Result<(), ValidationError>;

    fn validate_destination(&self, destination: &str) -> Result<(), ValidationError>;
}

/// Lookup of delivery records and statistics over them.
pub trait DeliveryTracker: Send + Sync {
    /// Returns the current state of the record with the given id.
    fn status(&self, id: &str) -> Result<DeliveryState, NotFoundError>;

    /// Returns counts per backend-defined category, computed on demand.
    fn statistics(&self) -> Statistics;
}

/// An observational log sink.
pub trait Logger: Send + Sync {
    fn log(&self, level: Level, message: &str);

    fn log_error(&self, error: &dyn std::error::Error) {
        self.log(Level::ERROR, &error.to_string());
    }

    fn log_info(&self, message: &str) {
        self.log(Level::INFO, message);
    }
}
