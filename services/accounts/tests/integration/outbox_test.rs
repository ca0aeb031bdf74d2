use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use phonepass_accounts::domain::types::{MAX_DELIVERY_ATTEMPTS, OTP_ISSUED_EVENT, PendingEvent};
use phonepass_accounts::usecase::outbox::{DispatchOutboxUseCase, DispatchReport, retry_delay};

use crate::helpers::{MockNotifier, MockOutboxRepo, TEST_PHONE};

fn otp_event(attempts: i32) -> PendingEvent {
    PendingEvent {
        id: Uuid::new_v4(),
        kind: OTP_ISSUED_EVENT.to_owned(),
        payload: json!({ "phone_number": TEST_PHONE, "code": "12345" }),
        attempts,
    }
}

fn dispatcher(
    outbox: MockOutboxRepo,
    notifier: MockNotifier,
) -> DispatchOutboxUseCase<MockOutboxRepo, MockNotifier> {
    DispatchOutboxUseCase {
        outbox,
        notifier,
        batch_size: 10,
        lease: Duration::seconds(60),
    }
}

#[tokio::test]
async fn should_deliver_due_event_and_mark_processed() {
    let now = Utc::now();
    let outbox = MockOutboxRepo::new(vec![otp_event(0)], now);
    let rows = outbox.rows_handle();
    let notifier = MockNotifier::default();
    let delivered = notifier.delivered_handle();

    let report = dispatcher(outbox, notifier).run_once(now).await.unwrap();

    assert_eq!(
        report,
        DispatchReport {
            delivered: 1,
            retried: 0,
            failed: 0
        }
    );
    assert_eq!(
        *delivered.lock().unwrap(),
        vec![(TEST_PHONE.to_owned(), "12345".to_owned())]
    );
    let rows = rows.lock().unwrap();
    assert!(rows[0].processed);
    assert_eq!(rows[0].event.attempts, 1);
}

#[tokio::test]
async fn should_skip_events_not_yet_due() {
    let now = Utc::now();
    let outbox = MockOutboxRepo::new(vec![otp_event(0)], now + Duration::seconds(30));
    let notifier = MockNotifier::default();
    let delivered = notifier.delivered_handle();

    let report = dispatcher(outbox, notifier).run_once(now).await.unwrap();

    assert_eq!(report, DispatchReport::default());
    assert!(delivered.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_schedule_retry_with_backoff_on_failure() {
    let now = Utc::now();
    let outbox = MockOutboxRepo::new(vec![otp_event(0)], now);
    let rows = outbox.rows_handle();

    let report = dispatcher(outbox, MockNotifier::failing())
        .run_once(now)
        .await
        .unwrap();

    assert_eq!(report.retried, 1);
    let rows = rows.lock().unwrap();
    assert!(!rows[0].processed && !rows[0].failed);
    assert_eq!(rows[0].event.attempts, 1);
    assert_eq!(rows[0].next_attempt_at, now + retry_delay(1));
    assert!(
        rows[0]
            .last_error
            .as_deref()
            .is_some_and(|e| e.contains("sms gateway unavailable"))
    );
}

#[tokio::test]
async fn should_mark_failed_after_max_attempts() {
    let now = Utc::now();
    let outbox = MockOutboxRepo::new(vec![otp_event(MAX_DELIVERY_ATTEMPTS - 1)], now);
    let rows = outbox.rows_handle();

    let report = dispatcher(outbox, MockNotifier::failing())
        .run_once(now)
        .await
        .unwrap();

    assert_eq!(report.failed, 1);
    let rows = rows.lock().unwrap();
    assert!(rows[0].failed);
    assert_eq!(rows[0].event.attempts, MAX_DELIVERY_ATTEMPTS);
}

#[tokio::test]
async fn should_fail_unknown_kind_without_notifying() {
    let now = Utc::now();
    let mut event = otp_event(0);
    event.kind = "something_else".to_owned();
    let outbox = MockOutboxRepo::new(vec![event], now);
    let rows = outbox.rows_handle();
    let notifier = MockNotifier::default();
    let delivered = notifier.delivered_handle();

    let report = dispatcher(outbox, notifier).run_once(now).await.unwrap();

    assert_eq!(report.failed, 1);
    assert!(delivered.lock().unwrap().is_empty());
    assert!(rows.lock().unwrap()[0].failed);
}

#[tokio::test]
async fn should_fail_malformed_payload() {
    let now = Utc::now();
    let mut event = otp_event(0);
    event.payload = json!({ "phone": TEST_PHONE });
    let outbox = MockOutboxRepo::new(vec![event], now);
    let rows = outbox.rows_handle();

    let report = dispatcher(outbox, MockNotifier::default())
        .run_once(now)
        .await
        .unwrap();

    assert_eq!(report.failed, 1);
    assert!(
        rows.lock().unwrap()[0]
            .last_error
            .as_deref()
            .is_some_and(|e| e.starts_with("malformed payload"))
    );
}

#[tokio::test]
async fn should_respect_batch_size() {
    let now = Utc::now();
    let events: Vec<_> = (0..5).map(|_| otp_event(0)).collect();
    let outbox = MockOutboxRepo::new(events, now);
    let mut uc = dispatcher(outbox, MockNotifier::default());
    uc.batch_size = 2;

    let first = uc.run_once(now).await.unwrap();
    let second = uc.run_once(now).await.unwrap();
    let third = uc.run_once(now).await.unwrap();

    assert_eq!(first.delivered, 2);
    assert_eq!(second.delivered, 2);
    assert_eq!(third.delivered, 1);
}
