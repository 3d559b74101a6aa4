//! Error types for validation, delivery, tracking and dispatch.

use crate::core::{Channel, DeliveryState};
use crate::types::RecordId;
use std::time::Duration;
use thiserror::Error;

/// A message or destination was rejected by a backend's rules.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("message must not be empty")]
    EmptyMessage,

    #[error("message too long ({len} characters, maximum {max})")]
    MessageTooLong { len: usize, max: usize },

    #[error("{0}")]
    InvalidDestination(String),
}

impl ValidationError {
    pub fn invalid_destination(reason: impl Into<String>) -> Self {
        Self::InvalidDestination(reason.into())
    }
}

/// A send failed. Delivery failures name the record created for them; a
/// rejected input never gets a record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("{channel} rejected the input: {reason}")]
    Rejected {
        channel: Channel,
        #[source]
        reason: ValidationError,
    },

    #[error("{channel} delivery failed: {reason}")]
    Transport {
        record_id: RecordId,
        channel: Channel,
        reason: String,
    },

    #[error("{channel} delivery timed out after {after:?}")]
    Timeout {
        record_id: RecordId,
        channel: Channel,
        after: Duration,
    },
}

impl SendError {
    /// The id of the failed delivery record, if one was created.
    pub fn record_id(&self) -> Option<&str> {
        match self {
            SendError::Transport { record_id, .. } | SendError::Timeout { record_id, .. } => {
                Some(record_id)
            }
            SendError::Rejected { .. } => None,
        }
    }
}

/// A tracking lookup referenced an id absent from the record store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("delivery record '{0}' not found")]
pub struct NotFoundError(pub RecordId);

/// A record was asked to move to a state its lifecycle does not allow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid delivery state transition: {from} -> {to}")]
pub struct TransitionError {
    pub from: DeliveryState,
    pub to: DeliveryState,
}

/// Record store update errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Why a backend produced a failure outcome during a dispatch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    #[error("validation failed: {0}")]
    Validation(ValidationError),

    #[error("invalid destination: {0}")]
    Destination(ValidationError),

    #[error(transparent)]
    Send(#[from] SendError),

    #[error("backend panicked: {0}")]
    Panicked(String),
}

impl FailureReason {
    /// The dispatch stage the failure happened in. Used as a metrics label.
    pub fn stage(&self) -> &'static str {
        match self {
            FailureReason::Validation(_) => "validation",
            FailureReason::Destination(_) => "destination",
            FailureReason::Send(_) => "send",
            FailureReason::Panicked(_) => "panic",
        }
    }

    /// Returns `true` if the send was skipped because validation failed.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            FailureReason::Validation(_) | FailureReason::Destination(_)
        )
    }
}
