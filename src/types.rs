//! Common type aliases used throughout the application.

use std::collections::BTreeMap;

/// Identifier of a delivery record, unique within its owning record store.
pub type RecordId = String;

/// Backend-defined statistics, keyed by category (e.g. "total", "sent").
pub type Statistics = BTreeMap<String, usize>;
