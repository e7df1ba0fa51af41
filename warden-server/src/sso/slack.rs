use crate::config::sso::SsoCredentials;
use crate::sso::{SsoError, SsoProvider, SsoUser};
use async_trait::async_trait;
use log::warn;
use reqwest::Client;
use serde::Deserialize;

const API_URL: &str = "https://slack.com/api";

pub struct SlackProvider {
    http: Client,
    credentials: SsoCredentials,
    redirect_uri: String,
    api_url: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    access_token: String,
}

#[derive(Deserialize, Default)]
struct SlackUser {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    image_512: Option<String>,
}

#[derive(Deserialize)]
struct IdentityResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    user: SlackUser,
}

impl SlackProvider {
    pub fn new(http: Client, credentials: SsoCredentials, redirect_uri: String) -> Self {
        Self {
            http,
            credentials,
            redirect_uri,
            api_url: API_URL.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_api_url(mut self, api_url: String) -> Self {
        self.api_url = api_url;
        self
    }
}

#[async_trait]
impl SsoProvider for SlackProvider {
    async fn get_token(&self, code: &str) -> Result<String, SsoError> {
        if code.is_empty() {
            return Err(SsoError::AccessDenied);
        }

        let response: TokenResponse = self
            .http
            .get(format!("{}/oauth.access", self.api_url))
            .query(&[
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !response.ok {
            return Err(SsoError::Provider("Slack rejected the code".to_string()));
        }
        if response.access_token.is_empty() {
            return Err(SsoError::AccessDenied);
        }

        Ok(response.access_token)
    }

    async fn get_user(&self, token: &str) -> Result<SsoUser, SsoError> {
        let response: IdentityResponse = self
            .http
            .get(format!("{}/users.identity", self.api_url))
            .query(&[("token", token)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !response.ok {
            return Err(SsoError::Provider("Slack rejected the token".to_string()));
        }

        let user = response.user;
        if user.id.is_empty() || user.name.is_empty() || user.email.is_empty() {
            warn!("Slack returned incomplete user data for id '{}'", user.id);
            return Err(SsoError::UserDataIncomplete);
        }

        Ok(SsoUser {
            id: user.id,
            email: user.email,
            name: user.name,
            picture: user.image_512.filter(|url| !url.is_empty()),
        })
    }
}
