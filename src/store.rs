//! In-memory store of delivery records.
//!
//! Each backend exclusively owns one `RecordStore`. Writes are serialized by
//! an internal lock, so a backend may be driven from several tasks at once.
//! Records are never removed; they live as long as the store.

use crate::core::{Channel, DeliveryRecord, DeliveryState};
use crate::error::{NotFoundError, StoreError};
use crate::stats;
use crate::types::{RecordId, Statistics};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::trace;

#[derive(Debug)]
pub struct RecordStore {
    channel: Channel,
    records: Mutex<HashMap<RecordId, DeliveryRecord>>,
    sequence: AtomicU64,
}

impl RecordStore {
    /// Creates an empty store for records of the given channel.
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            records: Mutex::new(HashMap::new()),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Creates a `Pending` record with one attempt and returns its id.
    pub fn create(&self, destination: &str, message: &str) -> RecordId {
        let created_at = Utc::now();
        let mut records = self.lock();
        let id = loop {
            let candidate = self.next_id(created_at);
            if !records.contains_key(&candidate) {
                break candidate;
            }
        };
        trace!(record_id = %id, channel = %self.channel, "Created delivery record");
        records.insert(
            id.clone(),
            DeliveryRecord::new(id.clone(), self.channel, destination, message, created_at),
        );
        id
    }

    /// Counts one more transport attempt against a record.
    pub fn record_attempt(&self, id: &str) -> Result<u32, NotFoundError> {
        let mut records = self.lock();
        let record = records
            .get_mut(id)
            .ok_or_else(|| NotFoundError(id.to_string()))?;
        Ok(record.bump_attempts())
    }

    pub fn mark_sent(&self, id: &str) -> Result<(), StoreError> {
        self.transition(id, DeliveryState::Sent, None)
    }

    /// Marks a record as failed. The reason becomes the record's `last_error`.
    pub fn mark_failed(&self, id: &str, reason: impl Into<String>) -> Result<(), StoreError> {
        self.transition(id, DeliveryState::Failed, Some(reason.into()))
    }

    /// Confirms delivery of a sent record.
    pub fn mark_delivered(&self, id: &str) -> Result<(), StoreError> {
        self.transition(id, DeliveryState::Delivered, None)
    }

    /// Returns a copy of the record with the given id.
    pub fn get(&self, id: &str) -> Result<DeliveryRecord, NotFoundError> {
        self.lock()
            .get(id)
            .cloned()
            .ok_or_else(|| NotFoundError(id.to_string()))
    }

    pub fn state(&self, id: &str) -> Result<DeliveryState, NotFoundError> {
        self.lock()
            .get(id)
            .map(DeliveryRecord::state)
            .ok_or_else(|| NotFoundError(id.to_string()))
    }

    /// Returns copies of all records, oldest first.
    pub fn snapshot(&self) -> Vec<DeliveryRecord> {
        let mut records: Vec<DeliveryRecord> = self.lock().values().cloned().collect();
        records.sort_by_key(|r| r.created_at());
        records
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Counts records by state.
    pub fn statistics(&self) -> Statistics {
        stats::aggregate(self.lock().values())
    }

    fn transition(
        &self,
        id: &str,
        next: DeliveryState,
        error: Option<String>,
    ) -> Result<(), StoreError> {
        let mut records = self.lock();
        let record = records
            .get_mut(id)
            .ok_or_else(|| NotFoundError(id.to_string()))?;
        record.transition(next, error)?;
        trace!(record_id = id, state = %next, "Delivery record updated");
        Ok(())
    }

    /// Ids look like `email_3f2a9c...`: the channel plus a truncated hash of
    /// a store-local sequence number and the creation time.
    fn next_id(&self, created_at: DateTime<Utc>) -> RecordId {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let data = format!(
            "{}::{}::{}",
            self.channel,
            sequence,
            created_at.timestamp_nanos_opt().unwrap_or_default()
        );
        let hash = blake3::hash(data.as_bytes()).to_hex();
        format!("{}_{}", self.channel, &hash.as_str()[..16])
    }

    // A panic while the lock was held cannot leave a record half-written,
    // so a poisoned lock is still safe to read.
    fn lock(&self) -> MutexGuard<'_, HashMap<RecordId, DeliveryRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
