//! A configurable backend for dispatcher tests.

use async_trait::async_trait;
use notifyhub::core::{
    Channel, DeliveryState, DeliveryTracker, MessageValidator, Notifier,
};
use notifyhub::error::{NotFoundError, SendError, ValidationError};
use notifyhub::store::RecordStore;
use notifyhub::types::{RecordId, Statistics};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Succeed,
    Fail,
    Panic,
}

/// A backend with tracking, and validation only when a rule is configured.
pub struct FakeBackend {
    name: String,
    require_at: bool,
    max_len: Option<usize>,
    behavior: Behavior,
    store: RecordStore,
    sends: AtomicUsize,
}

impl FakeBackend {
    /// Accepts any destination and has no validation capability.
    pub fn accepting(name: &str) -> Self {
        Self {
            name: name.to_string(),
            require_at: false,
            max_len: None,
            behavior: Behavior::Succeed,
            store: RecordStore::new(Channel::Chat),
            sends: AtomicUsize::new(0),
        }
    }

    /// Validates that destinations contain '@'.
    pub fn requiring_at(name: &str) -> Self {
        Self {
            require_at: true,
            store: RecordStore::new(Channel::Email),
            ..Self::accepting(name)
        }
    }

    /// Adds a message length limit (and thus the validation capability).
    pub fn with_max_len(mut self, max: usize) -> Self {
        self.max_len = Some(max);
        self
    }

    pub fn failing(mut self) -> Self {
        self.behavior = Behavior::Fail;
        self
    }

    pub fn panicking(mut self) -> Self {
        self.behavior = Behavior::Panic;
        self
    }

    pub fn send_count(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    fn has_rules(&self) -> bool {
        self.require_at || self.max_len.is_some()
    }
}

#[async_trait]
impl Notifier for FakeBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn channel(&self) -> Channel {
        self.store.channel()
    }

    async fn send(&self, destination: &str, message: &str) -> Result<RecordId, SendError> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        if self.behavior == Behavior::Panic {
            panic!("fake backend '{}' exploded", self.name);
        }

        let id = self.store.create(destination, message);
        match self.behavior {
            Behavior::Fail => {
                let err = SendError::Transport {
                    record_id: id.clone(),
                    channel: self.channel(),
                    reason: "simulated failure".to_string(),
                };
                self.store.mark_failed(&id, err.to_string()).unwrap();
                Err(err)
            }
            _ => {
                self.store.mark_sent(&id).unwrap();
                Ok(id)
            }
        }
    }

    fn as_validator(&self) -> Option<&dyn MessageValidator> {
        if self.has_rules() {
            Some(self)
        } else {
            None
        }
    }

    fn as_tracker(&self) -> Option<&dyn DeliveryTracker> {
        Some(self)
    }
}

impl MessageValidator for FakeBackend {
    fn validate_message(&self, message: &str) -> Result<(), ValidationError> {
        match self.max_len {
            Some(max) if message.chars().count() > max => Err(ValidationError::MessageTooLong {
                len: message.chars().count(),
                max,
            }),
            _ => Ok(()),
        }
    }

    fn validate_destination(&self, destination: &str) -> Result<(), ValidationError> {
        if self.require_at && !destination.contains('@') {
            return Err(ValidationError::invalid_destination("destination must contain '@'"));
        }
        Ok(())
    }
}

impl DeliveryTracker for FakeBackend {
    fn status(&self, id: &str) -> Result<DeliveryState, NotFoundError> {
        self.store.state(id)
    }

    fn statistics(&self) -> Statistics {
        self.store.statistics()
    }
}
