//! Token signing configuration

use confique::Config;

#[derive(Debug, Config, Clone)]
pub struct TokenConfig {
    /// HMAC secret used to sign and verify tokens (required)
    #[config(env = "WARDEN_TOKEN_SECRET")]
    pub secret: String,

    /// Lifetime of user session tokens in seconds (default: 86400 = 24 hours)
    #[config(env = "WARDEN_TOKEN_SESSION_TTL", default = 86400)]
    pub session_ttl: u64,

    /// Lifetime of client credential tokens in seconds (default: 600 = 10 minutes)
    #[config(env = "WARDEN_TOKEN_CLIENT_TTL", default = 600)]
    pub client_ttl: u64,
}
