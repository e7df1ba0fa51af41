use crate::config::sso::SsoCredentials;
use crate::sso::{SsoError, SsoProvider, SsoUser};
use async_trait::async_trait;
use log::warn;
use reqwest::Client;
use serde::Deserialize;

const TOKEN_URL: &str = "https://login.microsoftonline.com/common/oauth2/v2.0/token";
const USER_URL: &str = "https://graph.microsoft.com/v1.0/me";
const DEFAULT_NAME: &str = "Name Surname";

pub struct MicrosoftProvider {
    http: Client,
    credentials: SsoCredentials,
    redirect_uri: String,
    token_url: String,
    user_url: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    surname: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    mail: Option<String>,
    #[serde(default)]
    user_principal_name: Option<String>,
}

impl UserResponse {
    /// Given name and surname, falling back to the display name
    fn full_name(&self) -> String {
        let trimmed = |value: &Option<String>| value.as_deref().unwrap_or_default().trim().to_string();
        let (given, surname, display) = (
            trimmed(&self.given_name),
            trimmed(&self.surname),
            trimmed(&self.display_name),
        );

        if !given.is_empty() && !surname.is_empty() {
            format!("{given} {surname}")
        } else if !display.is_empty() {
            display
        } else {
            DEFAULT_NAME.to_string()
        }
    }
}

impl MicrosoftProvider {
    pub fn new(http: Client, credentials: SsoCredentials, redirect_uri: String) -> Self {
        Self {
            http,
            credentials,
            redirect_uri,
            token_url: TOKEN_URL.to_string(),
            user_url: USER_URL.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_endpoints(mut self, token_url: String, user_url: String) -> Self {
        self.token_url = token_url;
        self.user_url = user_url;
        self
    }
}

#[async_trait]
impl SsoProvider for MicrosoftProvider {
    async fn get_token(&self, code: &str) -> Result<String, SsoError> {
        if code.is_empty() {
            return Err(SsoError::AccessDenied);
        }

        let response: TokenResponse = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("scope", "user.read"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
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
            .get(&self.user_url)
            .bearer_auth(token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        // accounts without a mailbox only carry the principal name
        let email = response
            .mail
            .clone()
            .filter(|mail| !mail.is_empty())
            .or_else(|| response.user_principal_name.clone())
            .unwrap_or_default();

        if response.id.is_empty() || email.is_empty() {
            warn!("Microsoft returned incomplete user data for id '{}'", response.id);
            return Err(SsoError::UserDataIncomplete);
        }

        Ok(SsoUser {
            name: response.full_name(),
            id: response.id,
            email,
            picture: None,
        })
    }
}
