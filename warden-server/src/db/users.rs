use crate::db::models::{User, LOCAL_PROVIDER};
use crate::db::StoreError;
use chrono::{DateTime, Utc};
use sqlx::SqliteExecutor;

const USER_COLUMNS: &str = "id, email, password_hash, reset_password, language, firstname, \
    lastname, picture_url, active, last_login, login_attempts, last_login_attempt, \
    auth_provider, auth_provider_user_id";

pub async fn find_by_id<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
) -> Result<Option<User>, StoreError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = ? AND active = 1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(user)
}

/// Finds an active user that logs in with a local password
pub async fn find_local_by_email<'e>(
    executor: impl SqliteExecutor<'e>,
    email: &str,
) -> Result<Option<User>, StoreError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ? AND auth_provider = ? AND active = 1"
    ))
    .bind(email)
    .bind(LOCAL_PROVIDER)
    .fetch_optional(executor)
    .await?;

    Ok(user)
}

/// Counts a login attempt and returns the number of attempts in the current window.
///
/// The window opens with the first attempt after `window_start`, an attempt outside of it
/// restarts the count at one. Parallel attempts each see their own count.
pub async fn count_login_attempt<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
    now: DateTime<Utc>,
    window_start: DateTime<Utc>,
) -> Result<i64, StoreError> {
    let (attempts,): (i64,) = sqlx::query_as(
        r#"
        UPDATE users SET
            login_attempts = CASE WHEN last_login_attempt > ?1 THEN login_attempts + 1 ELSE 1 END,
            last_login_attempt = CASE WHEN last_login_attempt > ?1 THEN last_login_attempt ELSE ?2 END
        WHERE id = ?3
        RETURNING login_attempts
        "#,
    )
    .bind(window_start)
    .bind(now)
    .bind(id)
    .fetch_one(executor)
    .await?;

    Ok(attempts)
}

/// Stores a successful login and resets the failed attempt counter
pub async fn record_login<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    sqlx::query(
        "UPDATE users SET last_login = ?, login_attempts = 0, last_login_attempt = ? WHERE id = ?",
    )
    .bind(now)
    .bind(now)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(())
}

/// Replaces the password and clears the reset flag
pub async fn update_password<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
    password_hash: &str,
) -> Result<(), StoreError> {
    sqlx::query("UPDATE users SET password_hash = ?, reset_password = 0 WHERE id = ?")
        .bind(password_hash)
        .bind(id)
        .execute(executor)
        .await?;

    Ok(())
}

/// Replaces name and language of a user, returns the updated row
pub async fn update_profile<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
    firstname: &str,
    lastname: &str,
    language: &str,
) -> Result<Option<User>, StoreError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET firstname = ?, lastname = ?, language = ? WHERE id = ? AND active = 1 \
         RETURNING {USER_COLUMNS}"
    ))
    .bind(firstname)
    .bind(lastname)
    .bind(language)
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(user)
}

/// Profile reported by a single sign-on provider
#[derive(Debug, Clone)]
pub struct SsoProfile<'a> {
    pub provider: &'a str,
    pub provider_user_id: &'a str,
    pub email: &'a str,
    pub firstname: Option<&'a str>,
    pub lastname: Option<&'a str>,
    pub picture_url: Option<&'a str>,
}

/// Creates the user of a single sign-on account or refreshes its profile
pub async fn upsert_sso_user<'e>(
    executor: impl SqliteExecutor<'e>,
    profile: &SsoProfile<'_>,
    now: DateTime<Utc>,
) -> Result<User, StoreError> {
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (email, firstname, lastname, picture_url, last_login,
                           auth_provider, auth_provider_user_id)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (auth_provider, auth_provider_user_id) DO UPDATE SET
            email = excluded.email,
            firstname = excluded.firstname,
            lastname = excluded.lastname,
            picture_url = excluded.picture_url,
            last_login = excluded.last_login
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(profile.email)
    .bind(profile.firstname)
    .bind(profile.lastname)
    .bind(profile.picture_url)
    .bind(now)
    .bind(profile.provider)
    .bind(profile.provider_user_id)
    .fetch_one(executor)
    .await?;

    Ok(user)
}
