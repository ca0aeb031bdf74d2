use std::time::Duration;

use sea_orm::Database;
use tracing::info;

use phonepass_accounts::config::AccountsConfig;
use phonepass_accounts::infra::notifier::LogNotifier;
use phonepass_accounts::router::build_router;
use phonepass_accounts::state::AppState;
use phonepass_accounts::worker::{OutboxWorkerConfig, spawn_outbox_worker};
use phonepass_core::config::Config as _;
use phonepass_core::tracing::init_tracing;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = AccountsConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let state = AppState {
        db,
        code_expire_time: config.code_expire_time,
    };

    spawn_outbox_worker(
        state.outbox_repo(),
        LogNotifier,
        OutboxWorkerConfig {
            poll_interval: Duration::from_millis(config.outbox_poll_interval_ms),
            batch_size: config.outbox_batch_size,
        },
    );

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.accounts_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("accounts service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
