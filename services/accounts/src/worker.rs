use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::infra::db::DbOutboxRepository;
use crate::infra::notifier::LogNotifier;
use crate::usecase::outbox::DispatchOutboxUseCase;

/// Claimed events stay hidden from other dispatchers this long.
const CLAIM_LEASE_SECS: i64 = 60;

#[derive(Clone, Copy, Debug)]
pub struct OutboxWorkerConfig {
    pub poll_interval: Duration,
    pub batch_size: u64,
}

/// Spawn the background task delivering queued OTP notifications.
pub fn spawn_outbox_worker(
    outbox: DbOutboxRepository,
    notifier: LogNotifier,
    config: OutboxWorkerConfig,
) -> JoinHandle<()> {
    let poll_interval = if config.poll_interval.is_zero() {
        Duration::from_secs(1)
    } else {
        config.poll_interval
    };
    let usecase = DispatchOutboxUseCase {
        outbox,
        notifier,
        batch_size: config.batch_size,
        lease: chrono::Duration::seconds(CLAIM_LEASE_SECS),
    };

    tokio::spawn(async move {
        loop {
            match usecase.run_once(Utc::now()).await {
                Ok(report) if report != Default::default() => {
                    tracing::debug!(
                        delivered = report.delivered,
                        retried = report.retried,
                        failed = report.failed,
                        "outbox batch dispatched"
                    );
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "outbox batch failed"),
            }
            sleep(poll_interval).await;
        }
    })
}
