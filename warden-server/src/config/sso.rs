//! Single sign-on provider credentials
//!
//! A provider is only enabled when both its client id and secret are set.

use confique::Config;

#[derive(Debug, Config, Clone)]
pub struct SsoConfig {
    #[config(env = "WARDEN_SSO_GITHUB_CLIENT_ID")]
    pub github_client_id: Option<String>,
    #[config(env = "WARDEN_SSO_GITHUB_CLIENT_SECRET")]
    pub github_client_secret: Option<String>,

    #[config(env = "WARDEN_SSO_SLACK_CLIENT_ID")]
    pub slack_client_id: Option<String>,
    #[config(env = "WARDEN_SSO_SLACK_CLIENT_SECRET")]
    pub slack_client_secret: Option<String>,

    #[config(env = "WARDEN_SSO_GOOGLE_CLIENT_ID")]
    pub google_client_id: Option<String>,
    #[config(env = "WARDEN_SSO_GOOGLE_CLIENT_SECRET")]
    pub google_client_secret: Option<String>,

    #[config(env = "WARDEN_SSO_MICROSOFT_CLIENT_ID")]
    pub microsoft_client_id: Option<String>,
    #[config(env = "WARDEN_SSO_MICROSOFT_CLIENT_SECRET")]
    pub microsoft_client_secret: Option<String>,

    /// Timeout in seconds for calls to a provider (default: 10)
    #[config(env = "WARDEN_SSO_TIMEOUT", default = 10)]
    pub timeout: u64,
}

impl Default for SsoConfig {
    fn default() -> Self {
        Self {
            github_client_id: None,
            github_client_secret: None,
            slack_client_id: None,
            slack_client_secret: None,
            google_client_id: None,
            google_client_secret: None,
            microsoft_client_id: None,
            microsoft_client_secret: None,
            timeout: 10,
        }
    }
}

/// Client credentials of one enabled provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsoCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl SsoConfig {
    /// Credentials of the provider called `name`, if it is fully configured
    pub fn credentials(&self, name: &str) -> Option<SsoCredentials> {
        let (id, secret) = match name {
            "github" => (&self.github_client_id, &self.github_client_secret),
            "slack" => (&self.slack_client_id, &self.slack_client_secret),
            "google" => (&self.google_client_id, &self.google_client_secret),
            "microsoft" => (&self.microsoft_client_id, &self.microsoft_client_secret),
            _ => return None,
        };

        match (id.as_deref(), secret.as_deref()) {
            (Some(client_id), Some(client_secret))
                if !client_id.is_empty() && !client_secret.is_empty() =>
            {
                Some(SsoCredentials {
                    client_id: client_id.to_string(),
                    client_secret: client_secret.to_string(),
                })
            }
            _ => None,
        }
    }
}
