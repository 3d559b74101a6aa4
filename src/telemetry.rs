//! A metrics recorder that periodically logs all captured metrics.

use metrics::{Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit};
use metrics_util::registry::{AtomicStorage, Registry};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

/// Holds every counter, gauge and histogram in an in-memory registry and
/// logs their current values through `tracing` on a fixed interval.
pub struct LoggingRecorder {
    registry: Arc<Registry<Key, AtomicStorage>>,
}

impl LoggingRecorder {
    /// Creates the recorder and spawns the task that logs it.
    ///
    /// The task logs one final snapshot and exits when `shutdown_rx` fires.
    pub fn new(interval: Duration, mut shutdown_rx: watch::Receiver<()>) -> (Self, JoinHandle<()>) {
        let registry = Arc::new(Registry::new(AtomicStorage));
        let recorder = Self {
            registry: registry.clone(),
        };

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately; skip the empty snapshot.
            ticker.tick().await;
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => {
                        log_snapshot(&registry);
                        break;
                    }
                    _ = ticker.tick() => log_snapshot(&registry),
                }
            }
        });

        (recorder, handle)
    }
}

fn log_snapshot(registry: &Registry<Key, AtomicStorage>) {
    for (key, counter) in registry.get_counter_handles() {
        info!("[Counter] {}: {}", key, counter.load(Ordering::Relaxed));
    }
    for (key, gauge) in registry.get_gauge_handles() {
        info!("[Gauge] {}: {}", key, f64::from_bits(gauge.load(Ordering::Relaxed)));
    }
    for (key, histogram) in registry.get_histogram_handles() {
        let samples = histogram.data();
        if samples.is_empty() {
            continue;
        }
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        info!("[Histogram] {}: count={} mean={:.4}", key, samples.len(), mean);
    }
}

impl Recorder for LoggingRecorder {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        self.registry
            .get_or_create_counter(key, |c| c.clone())
            .into()
    }

    fn register_gauge(&self, key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        self.registry.get_or_create_gauge(key, |g| g.clone()).into()
    }

    fn register_histogram(&self, key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        self.registry
            .get_or_create_histogram(key, |h| h.clone())
            .into()
    }
}
