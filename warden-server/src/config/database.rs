//! Database configuration

use confique::Config;
use std::time::Duration;

#[derive(Debug, Config, Clone)]
pub struct DatabaseConfig {
    /// SQLite connection URL (default: sqlite://warden.db?mode=rwc)
    #[config(env = "WARDEN_DATABASE_URL", default = "sqlite://warden.db?mode=rwc")]
    pub url: String,

    /// Maximum number of pooled connections (default: 5)
    #[config(env = "WARDEN_DATABASE_MAX_CONNECTIONS", default = 5)]
    pub max_connections: u32,

    /// Deadline in seconds for a single write transaction (default: 10)
    #[config(env = "WARDEN_DATABASE_TRANSACTION_TIMEOUT", default = 10)]
    pub transaction_timeout: u64,
}

impl DatabaseConfig {
    pub fn transaction_deadline(&self) -> Duration {
        Duration::from_secs(self.transaction_timeout)
    }
}
