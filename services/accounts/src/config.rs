use serde::Deserialize;

use phonepass_core::config::Config;

/// Accounts service configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountsConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// TCP port to listen on (default 3120). Env var: `ACCOUNTS_PORT`.
    #[serde(default = "default_port")]
    pub accounts_port: u16,
    /// Seconds an issued one-time code stays valid (default 600). Env var: `CODE_EXPIRE_TIME`.
    #[serde(default = "default_code_expire_time")]
    pub code_expire_time: i64,
    /// Outbox dispatcher poll interval. Env var: `OUTBOX_POLL_INTERVAL_MS`.
    #[serde(default = "default_outbox_poll_interval_ms")]
    pub outbox_poll_interval_ms: u64,
    /// Events claimed per dispatcher tick. Env var: `OUTBOX_BATCH_SIZE`.
    #[serde(default = "default_outbox_batch_size")]
    pub outbox_batch_size: u64,
}

fn default_port() -> u16 {
    3120
}

fn default_code_expire_time() -> i64 {
    600
}

fn default_outbox_poll_interval_ms() -> u64 {
    1000
}

fn default_outbox_batch_size() -> u64 {
    32
}

impl Config for AccountsConfig {}
