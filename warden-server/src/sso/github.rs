use crate::config::sso::SsoCredentials;
use crate::sso::{SsoError, SsoProvider, SsoUser};
use async_trait::async_trait;
use http::header::{ACCEPT, AUTHORIZATION};
use log::warn;
use reqwest::Client;
use serde::Deserialize;

const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const API_URL: &str = "https://api.github.com";

pub struct GitHubProvider {
    http: Client,
    credentials: SsoCredentials,
    token_url: String,
    api_url: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
}

#[derive(Deserialize)]
struct UserResponse {
    #[serde(default)]
    id: u64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
}

#[derive(Deserialize)]
struct EmailResponse {
    email: String,
    #[serde(default)]
    primary: bool,
}

impl GitHubProvider {
    pub fn new(http: Client, credentials: SsoCredentials) -> Self {
        Self {
            http,
            credentials,
            token_url: TOKEN_URL.to_string(),
            api_url: API_URL.to_string(),
        }
    }

    /// Points the provider at different endpoints
    #[cfg(test)]
    pub fn with_endpoints(mut self, token_url: String, api_url: String) -> Self {
        self.token_url = token_url;
        self.api_url = api_url;
        self
    }

    async fn primary_email(&self, token: &str) -> Result<String, SsoError> {
        let emails: Vec<EmailResponse> = self
            .http
            .get(format!("{}/user/emails", self.api_url))
            .header(AUTHORIZATION, format!("token {token}"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        emails
            .into_iter()
            .find(|email| email.primary)
            .map(|email| email.email)
            .ok_or_else(|| SsoError::Provider("no primary email found".to_string()))
    }
}

#[async_trait]
impl SsoProvider for GitHubProvider {
    async fn get_token(&self, code: &str) -> Result<String, SsoError> {
        if code.is_empty() {
            return Err(SsoError::AccessDenied);
        }

        let response: TokenResponse = self
            .http
            .post(&self.token_url)
            .query(&[
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("code", code),
            ])
            .header(ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.access_token.is_empty() {
            return Err(SsoError::AccessDenied);
        }

        Ok(response.access_token)
    }

    async fn get_user(&self, token: &str) -> Result<SsoUser, SsoError> {
        let response: UserResponse = self
            .http
            .get(format!("{}/user", self.api_url))
            .header(AUTHORIZATION, format!("token {token}"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let email = self.primary_email(token).await?;
        let name = response.name.unwrap_or_default();

        if response.id == 0 || name.is_empty() || email.is_empty() {
            warn!("GitHub returned incomplete user data for id {}", response.id);
            return Err(SsoError::UserDataIncomplete);
        }

        Ok(SsoUser {
            id: response.id.to_string(),
            email,
            name,
            picture: response.avatar_url.filter(|url| !url.is_empty()),
        })
    }
}
