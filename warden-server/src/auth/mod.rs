//! Caller identity: token extraction, session users and password hashing.

pub(crate) mod middleware;

use crate::db::models::User;
use crate::db::{users, StoreError};
use crate::state::AppState;
use crate::token::Claims;
use http::header::{AUTHORIZATION, COOKIE};
use http::HeaderMap;
use log::{debug, error};

/// Token of an `Authorization: Bearer` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    Some(token.trim()).filter(|token| !token.is_empty())
}

/// Value of the cookie `name`, empty values count as missing
pub fn cookie_token<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// The bearer token if present, otherwise the session cookie
pub fn request_token<'h>(headers: &'h HeaderMap, cookie_name: &str) -> Option<&'h str> {
    bearer_token(headers).or_else(|| cookie_token(headers, cookie_name))
}

/// Resolves the logged-in user of a page request.
///
/// Client tokens, invalid tokens and inactive users all count as not logged in.
pub async fn session_user(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<(User, Claims)>, StoreError> {
    let Some(token) = request_token(headers, &state.config.cookie.name) else {
        return Ok(None);
    };

    let claims = match state.tokens.decode(token) {
        Ok(claims) if !claims.is_client() => claims,
        Ok(_) => return Ok(None),
        Err(e) => {
            debug!("Ignoring session token: {}", e);
            return Ok(None);
        }
    };

    let user = users::find_by_id(state.db.pool(), claims.sub).await?;
    Ok(user.map(|user| (user, claims)))
}

/// Minimum length of a new password in characters
pub const MIN_PASSWORD_LENGTH: usize = 8;

#[cfg(not(test))]
const PASSWORD_COST: u32 = bcrypt::DEFAULT_COST;
#[cfg(test)]
const PASSWORD_COST: u32 = 4;

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, PASSWORD_COST)
}

/// Hashes a new password of `user_id` on the blocking pool, `None` if that failed
pub async fn hash_new_password(user_id: i64, password: String) -> Option<String> {
    match tokio::task::spawn_blocking(move || hash_password(&password)).await {
        Ok(Ok(hash)) => Some(hash),
        Ok(Err(e)) => {
            error!("Failed to hash new password of user {}: {}", user_id, e);
            None
        }
        Err(e) => {
            error!("Password hashing task failed: {}", e);
            None
        }
    }
}

/// Returns false for users without a local password and for malformed hashes.
///
/// Hashing runs on the blocking pool.
pub async fn verify_password(user: &User, password: &str) -> bool {
    let Some(hash) = user.password_hash.clone() else {
        return false;
    };
    let password = password.to_string();
    let user_id = user.id;

    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await;
    match verified {
        Ok(Ok(matches)) => matches,
        Ok(Err(e)) => {
            error!("Stored password hash of user {} is unusable: {}", user_id, e);
            false
        }
        Err(e) => {
            error!("Password verification task failed: {}", e);
            false
        }
    }
}
