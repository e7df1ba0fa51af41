pub(crate) use crate::config::database::DatabaseConfig;
pub(crate) use crate::config::sso::SsoConfig;
pub(crate) use crate::config::token::TokenConfig;
pub(crate) use crate::config::web::{CookieConfig, HostsConfig};
use confique::Config;
use std::time::Duration;

pub mod database;
pub mod sso;
pub mod token;
pub mod web;

/// Optional configuration file read on startup, environment variables take precedence
const CONFIG_FILE: &str = "warden.toml";

/// Main configuration structure for the warden server
#[derive(Debug, Config, Clone)]
pub struct WardenConfig {
    /// The port the server will listen to (default: 7780)
    #[config(env = "WARDEN_PORT", default = 7780)]
    pub port: u16,

    /// Deadline in seconds for handling a single request (default: 30)
    #[config(env = "WARDEN_REQUEST_TIMEOUT", default = 30)]
    pub request_timeout: u64,

    /// Show the consent page again when a client asks for scopes the user never granted
    /// (default: false)
    #[config(env = "WARDEN_RECONSENT_ON_SCOPE_CHANGE", default = false)]
    pub reconsent_on_scope_change: bool,

    /// Capacity of the background task queue (default: 1024)
    #[config(env = "WARDEN_TASK_QUEUE_CAPACITY", default = 1024)]
    pub task_queue_capacity: usize,

    #[config(nested)]
    pub database: DatabaseConfig,

    #[config(nested)]
    pub token: TokenConfig,

    #[config(nested)]
    pub hosts: HostsConfig,

    #[config(nested)]
    pub cookie: CookieConfig,

    #[config(nested)]
    pub sso: SsoConfig,
}

impl WardenConfig {
    /// Loads the configuration from the environment and the optional `warden.toml`
    pub fn new() -> Result<Self, confique::Error> {
        Self::builder().env().file(CONFIG_FILE).load()
    }

    pub fn request_deadline(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    #[cfg(test)]
    pub fn for_test() -> Self {
        Self {
            port: 0, // Let the OS choose a port
            request_timeout: 5,
            reconsent_on_scope_change: false,
            task_queue_capacity: 16,
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
                transaction_timeout: 5,
            },
            token: TokenConfig {
                secret: "test-secret-that-is-long-enough-for-hs256".to_string(),
                session_ttl: 3600,
                client_ttl: 600,
            },
            hosts: HostsConfig {
                auth: "http://auth.test".to_string(),
                website: "http://website.test".to_string(),
            },
            cookie: CookieConfig {
                name: "access_token".to_string(),
                secure: false,
                domain: None,
            },
            sso: SsoConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment variables are process wide, keep every assertion on them in one test
    #[test]
    fn test_config_from_env() {
        for (name, _value) in std::env::vars() {
            if name.starts_with("WARDEN_") {
                std::env::remove_var(name);
            }
        }

        assert!(WardenConfig::new().is_err(), "token secret is required");

        std::env::set_var("WARDEN_TOKEN_SECRET", "secret");
        std::env::set_var("WARDEN_PORT", "9000");
        std::env::set_var("WARDEN_SSO_GITHUB_CLIENT_ID", "gh-id");

        let config = WardenConfig::new().unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.request_timeout, 30);
        assert!(!config.reconsent_on_scope_change);
        assert_eq!(config.token.secret, "secret");
        assert_eq!(config.token.session_ttl, 86400);
        assert_eq!(config.token.client_ttl, 600);
        assert_eq!(config.database.url, "sqlite://warden.db?mode=rwc");
        assert_eq!(config.database.transaction_timeout, 10);
        assert_eq!(config.cookie.name, "access_token");
        assert_eq!(config.cookie.domain, None);
        assert_eq!(config.sso.github_client_id.as_deref(), Some("gh-id"));
        assert_eq!(config.sso.timeout, 10);

        std::env::remove_var("WARDEN_TOKEN_SECRET");
        std::env::remove_var("WARDEN_PORT");
        std::env::remove_var("WARDEN_SSO_GITHUB_CLIENT_ID");
    }
}
