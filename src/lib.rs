//! notifyhub - a multi-channel notification dispatcher
//!
//! This library routes a destination and a message through a set of
//! independently implemented delivery backends (email, SMS, push, chat),
//! detecting which optional capabilities each backend offers and
//! aggregating per-backend outcomes.

pub mod app;
pub mod backends;
pub mod capability;
pub mod cli;
pub mod config;
pub mod core;
pub mod dispatcher;
pub mod error;
pub mod formatting;
pub mod logging;
pub mod stats;
pub mod store;
pub mod telemetry;
pub mod types;

// Re-export core types for convenience
pub use crate::core::*;
pub use dispatcher::{DispatchReport, Dispatcher, Outcome};
pub use error::{FailureReason, NotFoundError, SendError, ValidationError};
