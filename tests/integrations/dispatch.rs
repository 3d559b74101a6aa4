#[path = "../helpers/mod.rs"]
mod helpers;

use helpers::fake_backend::FakeBackend;
use helpers::recording_logger::RecordingLogger;
use helpers::quiet_config;
use notifyhub::backends::{EmailBackend, SimulatedTransport, SmsBackend};
use notifyhub::core::{DeliveryState, DeliveryTracker, Notifier};
use notifyhub::dispatcher::{Dispatcher, Outcome};
use notifyhub::error::{FailureReason, SendError, ValidationError};
use notifyhub::stats;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_validated_send_reaches_every_backend() {
    let open = Arc::new(FakeBackend::accepting("open"));
    let strict = Arc::new(FakeBackend::requiring_at("strict"));
    let mut dispatcher = Dispatcher::new();
    dispatcher.register(open.clone());
    dispatcher.register(strict.clone());

    let report = dispatcher.send_with_validation("user@x.com", "hi").await;

    assert_eq!(report.len(), 2);
    assert!(report.all_succeeded());
    assert_eq!(open.send_count(), 1);
    assert_eq!(strict.send_count(), 1);
}

#[tokio::test]
async fn test_destination_rejection_is_per_backend() {
    let open = Arc::new(FakeBackend::accepting("open"));
    let strict = Arc::new(FakeBackend::requiring_at("strict"));
    let mut dispatcher = Dispatcher::new();
    dispatcher.register(open.clone());
    dispatcher.register(strict.clone());

    let report = dispatcher.send_with_validation("user", "hi").await;

    assert_eq!(report.get("open"), Some(&Outcome::Success));
    match report.get("strict") {
        Some(Outcome::Failure(FailureReason::Destination(ValidationError::InvalidDestination(
            reason,
        )))) => assert!(reason.contains('@')),
        other => panic!("unexpected outcome: {:?}", other),
    }
    // The rejecting backend never reached its send step.
    assert_eq!(open.send_count(), 1);
    assert_eq!(strict.send_count(), 0);
    assert!(strict.store().is_empty());
}

#[tokio::test]
async fn test_failing_backend_statistics() {
    let broken = Arc::new(FakeBackend::accepting("broken").failing());
    let mut dispatcher = Dispatcher::new();
    dispatcher.register(broken.clone());

    let report = dispatcher.send_to_all("anyone", "hello").await;

    assert!(matches!(
        report.get("broken"),
        Some(Outcome::Failure(FailureReason::Send(_)))
    ));
    let stats = broken.statistics();
    assert_eq!(stats.get("failed"), Some(&1));
    assert_eq!(stats.get("pending"), Some(&0));
    assert_eq!(stats.get(stats::TOTAL), Some(&1));
}

#[tokio::test]
async fn test_report_has_one_entry_per_registration() {
    let mut dispatcher = Dispatcher::new();
    let keys = vec![
        dispatcher.register(Arc::new(FakeBackend::accepting("same"))),
        dispatcher.register(Arc::new(FakeBackend::accepting("same"))),
        dispatcher.register(Arc::new(FakeBackend::accepting("same#2"))),
        dispatcher.register(Arc::new(FakeBackend::requiring_at("other"))),
    ];
    assert_eq!(keys, vec!["same", "same#2", "same#3", "other"]);

    let report = dispatcher.send_to_all("user@example.com", "hi").await;
    assert_eq!(report.len(), dispatcher.len());
    for key in &keys {
        assert!(report.get(key).is_some(), "missing outcome for {}", key);
    }
}

#[tokio::test]
async fn test_empty_dispatcher_reports_nothing() {
    let dispatcher = Dispatcher::new();
    let report = dispatcher.send_with_validation("user@example.com", "hi").await;
    assert!(report.is_empty());
    assert!(report.all_succeeded());
}

#[tokio::test]
async fn test_broadcast_skips_validation() {
    let strict = Arc::new(FakeBackend::requiring_at("strict"));
    let mut dispatcher = Dispatcher::new();
    dispatcher.register(strict.clone());

    let report = dispatcher.send_to_all("no-at-sign", "hi").await;

    assert!(report.all_succeeded());
    assert_eq!(strict.send_count(), 1);
}

#[tokio::test]
async fn test_broadcast_still_applies_backend_rules() {
    let email = Arc::new(EmailBackend::new(&quiet_config().email));
    let open = Arc::new(FakeBackend::accepting("open"));
    let mut dispatcher = Dispatcher::new();
    dispatcher.register(email.clone());
    dispatcher.register(open.clone());

    let report = dispatcher.send_to_all("not-an-address", "").await;

    match report.get("email") {
        Some(Outcome::Failure(FailureReason::Send(SendError::Rejected { reason, .. }))) => {
            assert_eq!(
                reason,
                &ValidationError::invalid_destination("email address must contain '@'")
            );
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(report.get("open"), Some(&Outcome::Success));

    let stats = email.statistics();
    assert_eq!(stats.get("sent"), Some(&0));
    assert_eq!(stats.get(stats::TOTAL), Some(&0));
    assert!(email.records().is_empty());
}

#[tokio::test]
async fn test_message_rejection_precedes_destination() {
    let strict = Arc::new(FakeBackend::requiring_at("strict").with_max_len(3));
    let mut dispatcher = Dispatcher::new();
    dispatcher.register(strict.clone());

    // Both the message and the destination are bad; the message is reported.
    let report = dispatcher.send_with_validation("user", "too long").await;

    match report.get("strict").and_then(Outcome::failure) {
        Some(reason) => {
            assert!(reason.is_validation());
            assert_eq!(reason.stage(), "validation");
        }
        None => panic!("expected a validation failure"),
    }
    assert_eq!(strict.send_count(), 0);
}

#[tokio::test]
async fn test_over_length_sms_adds_no_record() {
    let mut config = quiet_config();
    config.sms.max_message_len = 10;
    let sms = Arc::new(SmsBackend::new(&config.sms));
    let mut dispatcher = Dispatcher::new();
    dispatcher.register(sms.clone());

    let before = sms.statistics();
    let report = dispatcher
        .send_with_validation("+15551234567", "this message is too long for sms")
        .await;

    assert!(matches!(
        report.get("sms"),
        Some(Outcome::Failure(FailureReason::Validation(
            ValidationError::MessageTooLong { max: 10, .. }
        )))
    ));
    assert_eq!(sms.statistics(), before);
    assert!(sms.records().is_empty());
}

#[tokio::test]
async fn test_statistics_are_stable_without_sends() {
    let email = Arc::new(EmailBackend::new(&quiet_config().email));
    let mut dispatcher = Dispatcher::new();
    dispatcher.register(email.clone());
    dispatcher.send_to_all("user@example.com", "one").await;
    dispatcher.send_to_all("user@example.com", "two").await;

    let first = email.statistics();
    let second = email.statistics();
    assert_eq!(first, second);
    assert_eq!(first.get("sent"), Some(&2));
    assert_eq!(first.get(stats::TOTAL), Some(&2));
}

#[tokio::test]
async fn test_status_round_trip() {
    let config = quiet_config();
    let reliable = EmailBackend::new(&config.email);
    let id = reliable.send("user@example.com", "hi").await.unwrap();
    assert_eq!(reliable.status(&id), Ok(DeliveryState::Sent));

    let broken = EmailBackend::with_transport(
        &config.email,
        Arc::new(SimulatedTransport::new(
            Duration::ZERO,
            1.0,
            "SMTP server unavailable",
        )),
    );
    let err = broken.send("user@example.com", "hi").await.unwrap_err();
    assert_eq!(broken.status(err.record_id().unwrap()), Ok(DeliveryState::Failed));
    let record = broken.records().get(err.record_id().unwrap()).unwrap();
    assert_eq!(record.attempts(), config.email.delivery.attempt_budget());
    assert!(record
        .last_error()
        .is_some_and(|e| e.contains("SMTP server unavailable")));

    assert!(broken.status("email_0000000000000000").is_err());
}

#[tokio::test]
async fn test_shared_logger_sees_every_outcome() {
    let logger = Arc::new(RecordingLogger::new());
    let mut dispatcher = Dispatcher::new();
    dispatcher.set_logger(logger.clone());
    dispatcher.register(Arc::new(FakeBackend::accepting("open")));
    dispatcher.register(Arc::new(FakeBackend::requiring_at("strict")));

    dispatcher.send_with_validation("user", "hi").await;

    assert!(logger.contains("Dispatching to 2 backends"));
    assert!(logger.contains("open succeeded"));
    let errors = logger.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("strict failed: invalid destination"));
}

#[tokio::test]
async fn test_email_backend_as_shared_logger() {
    let email = Arc::new(EmailBackend::new(&quiet_config().email));
    let mut dispatcher = Dispatcher::new();
    dispatcher.set_logger(email.clone());
    dispatcher.register(email.clone());
    dispatcher.register(Arc::new(FakeBackend::accepting("open").failing()));

    let report = dispatcher.send_to_all("user@example.com", "hi").await;

    assert!(dispatcher.logger().is_configured());
    assert_eq!(report.success_count(), 1);
    assert_eq!(report.failures().count(), 1);
}
