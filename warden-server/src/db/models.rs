use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Name of the auth provider for users with a local password
pub const LOCAL_PROVIDER: &str = "local";

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: Option<String>,
    pub reset_password: bool,
    pub language: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub picture_url: Option<String>,
    pub active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub login_attempts: i64,
    pub last_login_attempt: Option<DateTime<Utc>>,
    pub auth_provider: String,
    pub auth_provider_user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    pub name_normalized: String,
    pub expert: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct Member {
    pub id: i64,
    pub organization_id: i64,
    pub user_id: i64,
    pub read_only: bool,
    pub last_seen: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Client {
    pub id: i64,
    pub organization_id: Option<i64>,
    pub name: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: Option<String>,
    pub trusted: bool,
}

/// A scope row, either registered with a client or approved in a grant
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct GrantedScope {
    pub key: String,
    pub value: String,
}

impl GrantedScope {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Encodes the row the way it is embedded in tokens
    pub fn token_entry(&self) -> String {
        if self.value.is_empty() {
            self.key.clone()
        } else {
            format!("{}:{}", self.key, self.value)
        }
    }
}

impl From<&warden_scope::RequestedScope> for GrantedScope {
    fn from(scope: &warden_scope::RequestedScope) -> Self {
        Self::new(scope.name(), scope.value.clone())
    }
}

impl From<&warden_scope::Scope> for GrantedScope {
    fn from(scope: &warden_scope::Scope) -> Self {
        Self::new(scope.name.clone(), scope.access())
    }
}

/// Normalized organization name as sent in the `Organization` header
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
