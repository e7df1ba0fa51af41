//! Signing and verification of session and client tokens

use crate::config::TokenConfig;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token generation failed: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),
    #[error("Token expired")]
    Expired,
    #[error("Invalid token: {0}")]
    Invalid(String),
    #[error("Token lifetime of {0} seconds is out of range")]
    Lifetime(u64),
}

/// Claims carried by every token.
///
/// `sub` is the user id, or 0 for a token issued to an API client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default)]
    pub trusted: bool,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub is_sso_user: bool,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

impl Claims {
    pub fn is_client(&self) -> bool {
        self.sub == 0
    }

    /// Seconds until expiry, never negative
    pub fn expires_in(&self) -> i64 {
        (self.exp - Utc::now().timestamp()).max(0)
    }
}

/// A freshly signed token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl IssuedToken {
    /// Seconds left until expiry at the moment of the call
    pub fn expires_in(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds().max(0)
    }
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    session_ttl: Duration,
    client_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(config: &TokenConfig) -> Result<Self, TokenError> {
        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            session_ttl: lifetime(config.session_ttl)?,
            client_ttl: lifetime(config.client_ttl)?,
        })
    }

    /// Issues a session token for a user with the scopes exactly as approved
    pub fn issue(
        &self,
        user_id: i64,
        language: &str,
        scopes: Vec<String>,
        is_sso_user: bool,
    ) -> Result<IssuedToken, TokenError> {
        let now = Utc::now();
        let expires_at = now + self.session_ttl;
        let claims = Claims {
            sub: user_id,
            client_id: None,
            trusted: false,
            language: language.to_string(),
            scopes,
            is_sso_user,
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        self.sign(&claims, expires_at)
    }

    /// Issues a short-lived token for a client authenticated with its credentials
    pub fn issue_client(
        &self,
        client_id: &str,
        trusted: bool,
        scopes: Vec<String>,
    ) -> Result<IssuedToken, TokenError> {
        let now = Utc::now();
        let expires_at = now + self.client_ttl;
        let claims = Claims {
            sub: 0,
            client_id: Some(client_id.to_string()),
            trusted,
            language: String::new(),
            scopes,
            is_sso_user: false,
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        self.sign(&claims, expires_at)
    }

    fn sign(&self, claims: &Claims, expires_at: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let token = encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(TokenError::Encode)?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verifies signature, expiry and not-before of a token
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "nbf"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            debug!("Token validation failed: {:?}", e);
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            }
        })?;

        Ok(data.claims)
    }
}

/// Converts a configured lifetime, it must fit a timestamp counted from now
fn lifetime(seconds: u64) -> Result<Duration, TokenError> {
    i64::try_from(seconds)
        .ok()
        .and_then(Duration::try_seconds)
        .filter(|ttl| Utc::now().checked_add_signed(*ttl).is_some())
        .ok_or(TokenError::Lifetime(seconds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_scope::{Scope, ScopeSet};

    fn issuer(session_ttl: u64) -> TokenIssuer {
        TokenIssuer::new(&TokenConfig {
            secret: "unit-test-secret".to_string(),
            session_ttl,
            client_ttl: 600,
        })
        .unwrap()
    }

    #[test]
    fn test_issue_and_decode_user_token() {
        let issuer = issuer(3600);
        let issued = issuer
            .issue(42, "de", vec!["articles:r".into(), "lists:r".into()], false)
            .unwrap();

        let claims = issuer.decode(&issued.token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.language, "de");
        assert!(!claims.is_client());
        assert_eq!(claims.exp, issued.expires_at.timestamp());
        assert!(claims.expires_in() > 3500);

        let scopes = ScopeSet::from_token(&claims.scopes);
        assert!(scopes.satisfies(&[Scope::read("articles"), Scope::read("lists")]));
        assert!(!scopes.satisfies(&[Scope::read_write("lists")]));
    }

    #[test]
    fn test_client_token() {
        let issuer = issuer(3600);
        let issued = issuer
            .issue_client("abc", true, vec!["organization:r".into()])
            .unwrap();
        let claims = issuer.decode(&issued.token).unwrap();

        assert!(claims.is_client());
        assert!(claims.trusted);
        assert_eq!(claims.client_id.as_deref(), Some("abc"));
        assert!(issued.expires_in() <= 600);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let issuer = issuer(0);
        let issued = issuer.issue(1, "en", vec![], false).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(1100));

        assert!(matches!(issuer.decode(&issued.token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_foreign_signature_is_rejected() {
        let issued = issuer(3600).issue(1, "en", vec![], false).unwrap();
        let other = TokenIssuer::new(&TokenConfig {
            secret: "another-secret".to_string(),
            session_ttl: 3600,
            client_ttl: 600,
        })
        .unwrap();

        assert!(matches!(other.decode(&issued.token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_out_of_range_lifetime_is_rejected() {
        for session_ttl in [u64::MAX, i64::MAX as u64, 1 << 50] {
            let result = TokenIssuer::new(&TokenConfig {
                secret: "unit-test-secret".to_string(),
                session_ttl,
                client_ttl: 600,
            });
            assert!(
                matches!(result, Err(TokenError::Lifetime(ttl)) if ttl == session_ttl),
                "ttl {session_ttl}"
            );
        }
    }

    #[test]
    fn test_garbage_is_rejected_without_panic() {
        let issuer = issuer(3600);
        for token in ["", "abc", "a.b.c", "....", "ey.ey.ey"] {
            assert!(issuer.decode(token).is_err(), "token {token:?}");
        }
    }
}
