//! Capability detection for delivery backends.
//!
//! Backends never declare a fixed combination of capabilities. Each optional
//! capability is checked independently through the backend's `as_*` accessor;
//! a missing capability is a normal "not available" answer, not an error.
//! The composite "full" and "advanced" checks are derived from the same checks.

use crate::core::{DeliveryTracker, Logger, MessageValidator, Notifier};
use itertools::Itertools;
use serde::Serialize;
use std::fmt;

/// A behavioral facet a backend may implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Send,
    Validation,
    Tracking,
    Logging,
}

impl Capability {
    pub const ALL: [Capability; 4] = [
        Capability::Send,
        Capability::Validation,
        Capability::Tracking,
        Capability::Logging,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Send => "send",
            Capability::Validation => "validation",
            Capability::Tracking => "tracking",
            Capability::Logging => "logging",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The optional capabilities detected on a backend. Send is always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CapabilitySet {
    pub validation: bool,
    pub tracking: bool,
    pub logging: bool,
}

impl CapabilitySet {
    /// Checks every optional capability of `backend`.
    pub fn detect(backend: &dyn Notifier) -> Self {
        Self {
            validation: validator(backend).is_some(),
            tracking: tracker(backend).is_some(),
            logging: logger(backend).is_some(),
        }
    }

    pub fn contains(&self, capability: Capability) -> bool {
        match capability {
            Capability::Send => true,
            Capability::Validation => self.validation,
            Capability::Tracking => self.tracking,
            Capability::Logging => self.logging,
        }
    }

    /// Send + Validation.
    pub fn is_full(&self) -> bool {
        self.validation
    }

    /// Send + Validation + Tracking + Logging.
    pub fn is_advanced(&self) -> bool {
        self.validation && self.tracking && self.logging
    }

    /// The capabilities present, in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL.into_iter().filter(|c| self.contains(*c))
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.iter().join(", "))?;
        if self.is_advanced() {
            write!(f, " [advanced]")
        } else if self.is_full() {
            write!(f, " [full]")
        } else {
            Ok(())
        }
    }
}

/// Narrows a backend to its validation capability.
pub fn validator(backend: &dyn Notifier) -> Option<&dyn MessageValidator> {
    backend.as_validator()
}

/// Narrows a backend to its tracking capability.
pub fn tracker(backend: &dyn Notifier) -> Option<&dyn DeliveryTracker> {
    backend.as_tracker()
}

/// Narrows a backend to its logging capability.
pub fn logger(backend: &dyn Notifier) -> Option<&dyn Logger> {
    backend.as_logger()
}

pub fn is_full(backend: &dyn Notifier) -> bool {
    CapabilitySet::detect(backend).is_full()
}

pub fn is_advanced(backend: &dyn Notifier) -> bool {
    CapabilitySet::detect(backend).is_advanced()
}
