//! Delivery backends, one per channel.
//!
//! | backend | send | validation | tracking | logging |
//! |---------|------|------------|----------|---------|
//! | email   | yes  | yes        | yes      | yes     |
//! | sms     | yes  | yes        | yes      | yes     |
//! | push    | yes  |            | yes      |         |
//! | chat    | yes  |            |          |         |

pub mod chat;
pub mod email;
pub mod push;
pub mod sms;
pub mod transport;

pub use chat::ChatBackend;
pub use email::EmailBackend;
pub use push::PushBackend;
pub use sms::SmsBackend;
pub use transport::{SimulatedTransport, Transport, TransportError};

use crate::core::{BackendConfig, Channel, Logger, MessageValidator};
use crate::error::{SendError, ValidationError};
use crate::store::RecordStore;
use crate::types::RecordId;
use tracing::{debug, warn};

/// Runs one send: creates the record, makes up to `config.attempt_budget()`
/// transport attempts (each bounded by `config.timeout()`), and settles the
/// record as sent or failed.
pub(crate) async fn deliver(
    store: &RecordStore,
    transport: &dyn Transport,
    config: &BackendConfig,
    logger: Option<&dyn Logger>,
    destination: &str,
    message: &str,
) -> Result<RecordId, SendError> {
    let channel = store.channel();
    let id = store.create(destination, message);
    let budget = config.attempt_budget();
    let mut attempt = 1;

    loop {
        let failure = match tokio::time::timeout(
            config.timeout(),
            transport.deliver(destination, message),
        )
        .await
        {
            Ok(Ok(())) => {
                if let Err(e) = store.mark_sent(&id) {
                    warn!(record_id = %id, error = %e, "Could not mark record as sent");
                }
                if let Some(logger) = logger {
                    logger.log_info(&format!("{} sent successfully: {}", channel, id));
                }
                return Ok(id);
            }
            Ok(Err(e)) => SendError::Transport {
                record_id: id.clone(),
                channel,
                reason: e.0,
            },
            Err(_) => SendError::Timeout {
                record_id: id.clone(),
                channel,
                after: config.timeout(),
            },
        };

        if attempt >= budget {
            if let Err(e) = store.mark_failed(&id, failure.to_string()) {
                warn!(record_id = %id, error = %e, "Could not mark record as failed");
            }
            if let Some(logger) = logger {
                logger.log_error(&failure);
            }
            return Err(failure);
        }

        debug!(record_id = %id, attempt, error = %failure, "Delivery attempt failed, retrying");
        attempt = match store.record_attempt(&id) {
            Ok(n) => n,
            Err(_) => attempt + 1,
        };
    }
}

/// Shared message rule: non-empty and at most `max` characters.
pub(crate) fn check_length(message: &str, max: usize) -> Result<(), ValidationError> {
    let len = message.chars().count();
    if len == 0 {
        return Err(ValidationError::EmptyMessage);
    }
    if len > max {
        return Err(ValidationError::MessageTooLong { len, max });
    }
    Ok(())
}

/// Runs a backend's own rules ahead of a send, destination first.
pub(crate) fn check_input(
    validator: &dyn MessageValidator,
    channel: Channel,
    destination: &str,
    message: &str,
) -> Result<(), SendError> {
    validator
        .validate_destination(destination)
        .and_then(|()| validator.validate_message(message))
        .map_err(|reason| SendError::Rejected { channel, reason })
}
