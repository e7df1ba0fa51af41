//! Login through third-party identity providers.
//!
//! Each provider exchanges the code it redirected back with for an access token and then
//! reads the profile of the signed-in account.

mod github;
mod google;
mod microsoft;
mod slack;

pub use github::GitHubProvider;
pub use google::GoogleProvider;
pub use microsoft::MicrosoftProvider;
pub use slack::SlackProvider;

use crate::config::WardenConfig;
use async_trait::async_trait;
use log::info;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum SsoError {
    #[error("Access denied by provider")]
    AccessDenied,
    #[error("Provider returned incomplete user data")]
    UserDataIncomplete,
    #[error("Provider returned an error: {0}")]
    Provider(String),
    #[error("Request to provider failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Profile of a provider account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsoUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

impl SsoUser {
    /// Splits the display name into first and last name, the last word is the last name
    pub fn split_name(&self) -> (Option<&str>, Option<&str>) {
        let name = self.name.trim();
        match name.rsplit_once(' ') {
            Some((first, last)) => (Some(first.trim()).filter(|s| !s.is_empty()), Some(last)),
            None => (None, Some(name).filter(|s| !s.is_empty())),
        }
    }
}

#[async_trait]
pub trait SsoProvider: Send + Sync {
    /// Exchanges the authorization code for an access token
    async fn get_token(&self, code: &str) -> Result<String, SsoError>;

    /// Reads the profile of the account the token belongs to
    async fn get_user(&self, token: &str) -> Result<SsoUser, SsoError>;
}

/// Names of the supported providers in the order they are offered on the login page
pub const PROVIDER_NAMES: [&str; 4] = ["github", "slack", "google", "microsoft"];

/// Enabled providers by lowercase name
pub type SsoProviders = HashMap<&'static str, Arc<dyn SsoProvider>>;

/// Creates the providers that have credentials configured
pub fn build_providers(config: &WardenConfig) -> Result<SsoProviders, SsoError> {
    let http = Client::builder()
        .timeout(Duration::from_secs(config.sso.timeout))
        .connect_timeout(Duration::from_secs(2))
        .user_agent("warden")
        .build()?;

    let callback = |name: &str| callback_url(config, name);
    let mut providers = SsoProviders::new();

    if let Some(credentials) = config.sso.credentials("github") {
        providers.insert("github", Arc::new(GitHubProvider::new(http.clone(), credentials)));
    }
    if let Some(credentials) = config.sso.credentials("slack") {
        providers.insert(
            "slack",
            Arc::new(SlackProvider::new(http.clone(), credentials, callback("slack"))),
        );
    }
    if let Some(credentials) = config.sso.credentials("google") {
        providers.insert(
            "google",
            Arc::new(GoogleProvider::new(http.clone(), credentials, callback("google"))),
        );
    }
    if let Some(credentials) = config.sso.credentials("microsoft") {
        providers.insert(
            "microsoft",
            Arc::new(MicrosoftProvider::new(
                http.clone(),
                credentials,
                callback("microsoft"),
            )),
        );
    }

    info!(
        "Enabled single sign-on providers: {:?}",
        providers.keys().collect::<Vec<_>>()
    );
    Ok(providers)
}

fn callback_url(config: &WardenConfig, name: &str) -> String {
    format!("{}/sso/{}", config.hosts.auth.trim_end_matches('/'), name)
}

/// Link that starts the sign-in at a provider, `None` if the provider is not configured
pub fn authorize_url(config: &WardenConfig, name: &str) -> Option<String> {
    let credentials = config.sso.credentials(name)?;
    let callback = callback_url(config, name);
    let client_id = credentials.client_id.as_str();

    let url = match name {
        "github" => Url::parse_with_params(
            "https://github.com/login/oauth/authorize",
            &[("client_id", client_id), ("scope", "user:email")],
        ),
        "slack" => Url::parse_with_params(
            "https://slack.com/oauth/authorize",
            &[
                ("client_id", client_id),
                ("scope", "identity.basic,identity.email,identity.avatar"),
                ("redirect_uri", callback.as_str()),
            ],
        ),
        "google" => Url::parse_with_params(
            "https://accounts.google.com/o/oauth2/v2/auth",
            &[
                ("client_id", client_id),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("redirect_uri", callback.as_str()),
            ],
        ),
        "microsoft" => Url::parse_with_params(
            "https://login.microsoftonline.com/common/oauth2/v2.0/authorize",
            &[
                ("client_id", client_id),
                ("response_type", "code"),
                ("scope", "User.Read"),
                ("redirect_uri", callback.as_str()),
            ],
        ),
        _ => return None,
    };

    url.ok().map(String::from)
}
