use crate::config::sso::SsoCredentials;
use crate::sso::{SsoError, SsoProvider, SsoUser};
use async_trait::async_trait;
use http::header::ACCEPT;
use log::warn;
use reqwest::Client;
use serde::Deserialize;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USER_URL: &str = "https://www.googleapis.com/oauth2/v1/userinfo?alt=json";

pub struct GoogleProvider {
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
struct UserResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    picture: Option<String>,
}

impl GoogleProvider {
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
impl SsoProvider for GoogleProvider {
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
                ("redirect_uri", self.redirect_uri.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
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
            .get(&self.user_url)
            .bearer_auth(token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.id.is_empty() || response.name.is_empty() || response.email.is_empty() {
            warn!("Google returned incomplete user data for id '{}'", response.id);
            return Err(SsoError::UserDataIncomplete);
        }

        Ok(SsoUser {
            id: response.id,
            email: response.email,
            name: response.name,
            picture: response.picture.filter(|url| !url.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> GoogleProvider {
        GoogleProvider::new(
            Client::new(),
            SsoCredentials {
                client_id: "g-id".to_string(),
                client_secret: "g-secret".to_string(),
            },
            "http://auth.test/sso/google".to_string(),
        )
        .with_endpoints(
            format!("{}/token", server.uri()),
            format!("{}/userinfo", server.uri()),
        )
    }

    #[tokio::test]
    async fn test_token_and_user() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(query_param("grant_type", "authorization_code"))
            .and(query_param("redirect_uri", "http://auth.test/sso/google"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "g-1",
                "name": "Jane Doe",
                "email": "jane@example.com"
            })))
            .mount(&server)
            .await;

        let provider = provider(&server);
        let token = provider.get_token("code").await.unwrap();
        let user = provider.get_user(&token).await.unwrap();
        assert_eq!(user.id, "g-1");
        assert_eq!(user.email, "jane@example.com");
        assert_eq!(user.picture, None);
    }

    #[tokio::test]
    async fn test_missing_access_token_is_denied() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "invalid_grant"})))
            .mount(&server)
            .await;

        let result = provider(&server).get_token("code").await;
        assert!(matches!(result, Err(SsoError::AccessDenied)));
    }
}
