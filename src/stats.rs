//! Delivery statistics derived from record stores.
//!
//! Statistics are computed on demand by counting records per state. Nothing
//! is cached, so two reads with no send in between always agree.

use crate::core::{DeliveryRecord, DeliveryState};
use crate::types::Statistics;

pub const TOTAL: &str = "total";

/// Categories reported even when their count is zero.
const BASELINE: [&str; 4] = [TOTAL, "sent", "failed", "pending"];

/// Counts records by state, plus a `total` category.
///
/// `delivered` only appears once a record has reached that state.
pub fn aggregate<'a, I>(records: I) -> Statistics
where
    I: IntoIterator<Item = &'a DeliveryRecord>,
{
    let mut stats: Statistics = BASELINE
        .iter()
        .map(|category| (category.to_string(), 0))
        .collect();

    for record in records {
        *stats.entry(TOTAL.to_string()).or_insert(0) += 1;
        *stats.entry(record.state().as_str().to_string()).or_insert(0) += 1;
    }
    stats
}

/// Looks up the count for a state, treating a missing category as zero.
pub fn count(stats: &Statistics, state: DeliveryState) -> usize {
    stats.get(state.as_str()).copied().unwrap_or(0)
}

/// Sums statistics from several backends category by category.
///
/// The dispatcher never does this itself; it is a convenience for callers
/// that want system-wide totals.
pub fn merge<I>(all: I) -> Statistics
where
    I: IntoIterator<Item = Statistics>,
{
    let mut merged = Statistics::new();
    for stats in all {
        for (category, value) in stats {
            *merged.entry(category).or_insert(0) += value;
        }
    }
    merged
}
