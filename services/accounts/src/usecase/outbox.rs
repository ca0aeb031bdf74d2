use chrono::{DateTime, Duration, Utc};

use crate::domain::repository::{Notifier, OutboxRepository};
use crate::domain::types::{
    MAX_DELIVERY_ATTEMPTS, OTP_ISSUED_EVENT, OtpIssuedPayload, PendingEvent,
};
use crate::error::AccountsServiceError;

const BASE_RETRY_DELAY_SECS: i64 = 2;
const MAX_RETRY_DELAY_SECS: i64 = 300;

/// Delay before retry number `attempts` (1-based): 2s, 4s, 8s ... capped at 5 minutes.
pub fn retry_delay(attempts: i32) -> Duration {
    let exponent = attempts.saturating_sub(1).clamp(0, 16) as u32;
    let secs = BASE_RETRY_DELAY_SECS.saturating_mul(1_i64 << exponent);
    Duration::seconds(secs.min(MAX_RETRY_DELAY_SECS))
}

/// Counts from one dispatcher pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub retried: usize,
    pub failed: usize,
}

enum Delivery {
    Delivered,
    Retry(String),
    Fatal(String),
}

// ── DispatchOutbox ───────────────────────────────────────────────────────────

/// Drains due outbox events into the notifier.
pub struct DispatchOutboxUseCase<O, N>
where
    O: OutboxRepository,
    N: Notifier,
{
    pub outbox: O,
    pub notifier: N,
    pub batch_size: u64,
    /// How long a claimed event is hidden from other dispatchers.
    pub lease: Duration,
}

impl<O, N> DispatchOutboxUseCase<O, N>
where
    O: OutboxRepository,
    N: Notifier,
{
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<DispatchReport, AccountsServiceError> {
        let events = self
            .outbox
            .claim_due(now, self.batch_size, now + self.lease)
            .await?;

        let mut report = DispatchReport::default();
        for event in events {
            let attempts = event.attempts + 1;
            match self.deliver(&event).await {
                Delivery::Delivered => {
                    self.outbox.mark_processed(event.id, attempts).await?;
                    report.delivered += 1;
                }
                Delivery::Retry(error) if attempts < MAX_DELIVERY_ATTEMPTS => {
                    tracing::warn!(event_id = %event.id, attempts, error = %error, "outbox delivery failed, retrying");
                    self.outbox
                        .mark_retry(event.id, attempts, &error, now + retry_delay(attempts))
                        .await?;
                    report.retried += 1;
                }
                Delivery::Retry(error) | Delivery::Fatal(error) => {
                    tracing::error!(event_id = %event.id, kind = %event.kind, attempts, error = %error, "outbox event failed");
                    self.outbox.mark_failed(event.id, attempts, &error).await?;
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }

    async fn deliver(&self, event: &PendingEvent) -> Delivery {
        if event.kind != OTP_ISSUED_EVENT {
            return Delivery::Fatal(format!("unknown event kind {:?}", event.kind));
        }
        let payload: OtpIssuedPayload = match serde_json::from_value(event.payload.clone()) {
            Ok(payload) => payload,
            Err(e) => return Delivery::Fatal(format!("malformed payload: {e}")),
        };
        match self
            .notifier
            .deliver(&payload.phone_number, &payload.code)
            .await
        {
            Ok(()) => Delivery::Delivered,
            Err(e) => Delivery::Retry(format!("{e:#}")),
        }
    }
}
