//! Fan-out of a single notification to every registered backend.
//!
//! The dispatcher owns an ordered list of backends and an optional shared
//! logger. A dispatch is a best-effort broadcast: every backend produces an
//! [`Outcome`], and no backend's failure stops the others from running.
//!
//! Backends are visited in registration order. In concurrent mode one tokio
//! task is spawned per backend and the report is assembled once every task
//! has finished; a panicking backend is recorded as a failure.

use crate::capability;
use crate::config::DispatchConfig;
use crate::core::{Logger, Notifier};
use crate::error::FailureReason;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// The result of one backend within one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(FailureReason),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match self {
            Outcome::Success => None,
            Outcome::Failure(reason) => Some(reason),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => f.write_str("success"),
            Outcome::Failure(reason) => write!(f, "failure: {}", reason),
        }
    }
}

/// Outcomes of one dispatch, keyed by backend registration key.
///
/// Built fresh for every dispatch call and owned by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    outcomes: BTreeMap<String, Outcome>,
}

impl DispatchReport {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Outcome> {
        self.outcomes.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Outcome)> {
        self.outcomes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_success()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &FailureReason)> {
        self.outcomes
            .iter()
            .filter_map(|(k, o)| o.failure().map(|reason| (k.as_str(), reason)))
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.values().all(Outcome::is_success)
    }

    fn insert(&mut self, key: String, outcome: Outcome) {
        self.outcomes.insert(key, outcome);
    }
}

impl IntoIterator for DispatchReport {
    type Item = (String, Outcome);
    type IntoIter = std::collections::btree_map::IntoIter<String, Outcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.into_iter()
    }
}

/// The dispatcher's logger slot. Logging through an empty slot is a no-op.
#[derive(Clone, Default)]
pub struct SharedLogger(Option<Arc<dyn Logger>>);

impl SharedLogger {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self(Some(logger))
    }

    pub fn is_configured(&self) -> bool {
        self.0.is_some()
    }

    pub fn info(&self, message: &str) {
        if let Some(logger) = &self.0 {
            logger.log_info(message);
        }
    }

    pub fn error(&self, error: &dyn std::error::Error) {
        if let Some(logger) = &self.0 {
            logger.log_error(error);
        }
    }
}

/// A failure outcome as handed to the shared logger.
#[derive(Error, Debug)]
#[error("{key} failed: {reason}")]
struct BackendFailed {
    key: String,
    #[source]
    reason: FailureReason,
}

impl fmt::Debug for SharedLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedLogger")
            .field(&self.is_configured())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Broadcast,
    Validated,
}

struct Registration {
    key: String,
    backend: Arc<dyn Notifier>,
}

pub struct Dispatcher {
    backends: Vec<Registration>,
    logger: SharedLogger,
    concurrent: bool,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Creates an empty, sequential dispatcher with no logger.
    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
            logger: SharedLogger::default(),
            concurrent: false,
        }
    }

    pub fn from_config(config: &DispatchConfig) -> Self {
        Self::new().concurrent(config.concurrent)
    }

    /// Dispatch to all backends in parallel, one task per backend.
    pub fn concurrent(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    pub fn is_concurrent(&self) -> bool {
        self.concurrent
    }

    /// Appends a backend and returns the key its outcomes are reported under.
    ///
    /// The key is the backend's name. A backend whose name is already taken
    /// gets the next free `name#N` suffix, starting at `#2`.
    pub fn register(&mut self, backend: Arc<dyn Notifier>) -> String {
        let key = self.unique_key(backend.name());
        debug!(backend = backend.name(), key = %key, "Registering backend");
        self.logger.info(&format!(
            "Registered {} backend '{}' as '{}'",
            backend.channel(),
            backend.name(),
            key
        ));
        self.backends.push(Registration {
            key: key.clone(),
            backend,
        });
        key
    }

    /// Replaces the shared logger.
    pub fn set_logger(&mut self, logger: Arc<dyn Logger>) {
        self.logger = SharedLogger::new(logger);
    }

    pub fn logger(&self) -> &SharedLogger {
        &self.logger
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Registered backends with their keys, in registration order.
    pub fn backends(&self) -> impl Iterator<Item = (&str, &Arc<dyn Notifier>)> {
        self.backends
            .iter()
            .map(|r| (r.key.as_str(), &r.backend))
    }

    /// Sends through every backend without validation.
    #[instrument(skip(self, message), fields(backends = self.backends.len()))]
    pub async fn send_to_all(&self, destination: &str, message: &str) -> DispatchReport {
        self.dispatch(destination, message, Mode::Broadcast).await
    }

    /// Sends through every backend, first running the validation capability
    /// of backends that have one. A backend that rejects the message or the
    /// destination is reported as failed and is not sent through.
    #[instrument(skip(self, message), fields(backends = self.backends.len()))]
    pub async fn send_with_validation(&self, destination: &str, message: &str) -> DispatchReport {
        self.dispatch(destination, message, Mode::Validated).await
    }

    async fn dispatch(&self, destination: &str, message: &str, mode: Mode) -> DispatchReport {
        self.logger.info(&format!(
            "Dispatching to {} backends",
            self.backends.len()
        ));

        let mut report = DispatchReport::default();
        if self.concurrent {
            let (keys, tasks): (Vec<_>, Vec<_>) = self
                .backends
                .iter()
                .map(|registration| {
                    let key = registration.key.clone();
                    let backend = registration.backend.clone();
                    let destination = destination.to_string();
                    let message = message.to_string();
                    let task_key = key.clone();
                    let task = tokio::spawn(async move {
                        deliver_one(&task_key, backend.as_ref(), &destination, &message, mode)
                            .await
                    });
                    (key, task)
                })
                .unzip();

            for (key, result) in keys.into_iter().zip(join_all(tasks).await) {
                let outcome = match result {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!(backend = %key, error = %e, "Backend task did not complete");
                        Outcome::Failure(FailureReason::Panicked(e.to_string()))
                    }
                };
                self.observe(&key, &outcome);
                report.insert(key, outcome);
            }
        } else {
            for registration in &self.backends {
                let outcome = deliver_one(
                    &registration.key,
                    registration.backend.as_ref(),
                    destination,
                    message,
                    mode,
                )
                .await;
                self.observe(&registration.key, &outcome);
                report.insert(registration.key.clone(), outcome);
            }
        }

        info!(
            backends = report.len(),
            succeeded = report.success_count(),
            "Dispatch finished"
        );
        report
    }

    fn observe(&self, key: &str, outcome: &Outcome) {
        match outcome {
            Outcome::Success => {
                metrics::counter!("notifications_sent_total", "backend" => key.to_string())
                    .increment(1);
                self.logger.info(&format!("{} succeeded", key));
            }
            Outcome::Failure(reason) => {
                metrics::counter!(
                    "notifications_failed_total",
                    "backend" => key.to_string(),
                    "stage" => reason.stage()
                )
                .increment(1);
                self.logger.error(&BackendFailed {
                    key: key.to_string(),
                    reason: reason.clone(),
                });
            }
        }
    }

    fn unique_key(&self, name: &str) -> String {
        let taken = |candidate: &str| self.backends.iter().any(|r| r.key == candidate);
        if !taken(name) {
            return name.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}#{}", name, n);
            if !taken(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Validates (when asked and when the backend can) and then sends.
async fn deliver_one(
    key: &str,
    backend: &dyn Notifier,
    destination: &str,
    message: &str,
    mode: Mode,
) -> Outcome {
    if mode == Mode::Validated {
        if let Some(validator) = capability::validator(backend) {
            if let Err(e) = validator.validate_message(message) {
                debug!(backend = key, error = %e, "Message rejected");
                return Outcome::Failure(FailureReason::Validation(e));
            }
            if let Err(e) = validator.validate_destination(destination) {
                debug!(backend = key, error = %e, "Destination rejected");
                return Outcome::Failure(FailureReason::Destination(e));
            }
        }
    }

    let start = Instant::now();
    let result = backend.send(destination, message).await;
    metrics::histogram!("notification_send_duration_seconds", "backend" => key.to_string())
        .record(start.elapsed().as_secs_f64());

    match result {
        Ok(record_id) => {
            debug!(backend = key, record_id = %record_id, "Backend delivered");
            Outcome::Success
        }
        Err(e) => {
            debug!(backend = key, error = %e, "Backend failed");
            Outcome::Failure(e.into())
        }
    }
}
