use super::html::{self, LoginForm, SsoLink};
use super::i18n::{self, Lang};
use super::{login_redirect, page, server_error, with_cookie, with_query, LOGIN_PATH};
use crate::auth::{session_user, verify_password};
use crate::db::users;
use crate::sso::{authorize_url, PROVIDER_NAMES};
use crate::state::AppState;
use crate::tasks::Task;
use axum::extract::{Query, State};
use axum::response::Response;
use axum::Form;
use chrono::{DateTime, Duration, Utc};
use http::HeaderMap;
use log::{error, info, warn};
use serde::Deserialize;

/// Attempts allowed per window, the next one is rejected without checking the password
const MAX_LOGIN_ATTEMPTS: i64 = 5;
/// Length of the lockout window in minutes
const LOCKOUT_MINUTES: i64 = 5;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct RedirectQuery {
    pub(super) redirect: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct LoginCredentials {
    email: String,
    password: String,
}

pub(super) async fn login_page_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<RedirectQuery>,
) -> Response {
    let lang = Lang::from_headers(&headers);

    match session_user(&state, &headers).await {
        Ok(Some((user, _))) => login_redirect(&state, lang, &user, query.redirect.as_deref()),
        Ok(None) => render_login(&state, lang, query.redirect.as_deref(), "", None),
        Err(e) => {
            error!("Failed to resolve session user: {}", e);
            server_error()
        }
    }
}

pub(super) async fn login_submit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<RedirectQuery>,
    Form(credentials): Form<LoginCredentials>,
) -> Response {
    let lang = Lang::from_headers(&headers);
    let redirect = query.redirect.as_deref();
    let text = i18n::login(lang);

    match session_user(&state, &headers).await {
        Ok(Some((user, _))) => return login_redirect(&state, lang, &user, redirect),
        Ok(None) => {}
        Err(e) => {
            error!("Failed to resolve session user: {}", e);
            return server_error();
        }
    }

    let email = credentials.email.trim();
    if email.is_empty() || credentials.password.is_empty() {
        return render_login(&state, lang, redirect, email, Some(text.input_err));
    }

    let user = match users::find_local_by_email(state.db.pool(), email).await {
        Ok(Some(user)) => user,
        Ok(None) => return render_login(&state, lang, redirect, email, Some(text.login_err)),
        Err(e) => {
            error!("Failed to look up user on login: {}", e);
            return server_error();
        }
    };

    let now = Utc::now();
    let attempts =
        match users::count_login_attempt(state.db.pool(), user.id, now, window_start(now)).await {
            Ok(attempts) => attempts,
            Err(e) => {
                error!("Failed to count login attempt of user {}: {}", user.id, e);
                return server_error();
            }
        };
    if attempts > MAX_LOGIN_ATTEMPTS {
        warn!("Login of user {} rejected, too many attempts", user.id);
        return render_login(&state, lang, redirect, email, Some(text.attempts_err));
    }

    if !verify_password(&user, &credentials.password).await {
        return render_login(&state, lang, redirect, email, Some(text.login_err));
    }

    let issued = match state.tokens.issue(user.id, &user.language, Vec::new(), false) {
        Ok(issued) => issued,
        Err(e) => {
            error!("Failed to issue session token for user {}: {}", user.id, e);
            return server_error();
        }
    };

    if let Err(e) = users::record_login(state.db.pool(), user.id, now).await {
        error!("Failed to record login of user {}: {}", user.id, e);
    }
    state.tasks.enqueue(Task::RecordLogin { user_id: user.id });
    info!("User {} logged in", user.id);

    let cookie = state
        .config
        .cookie
        .session(&issued.token, issued.expires_in());
    with_cookie(login_redirect(&state, lang, &user, redirect), &cookie)
}

fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::minutes(LOCKOUT_MINUTES)
}

fn render_login(
    state: &AppState,
    lang: Lang,
    redirect: Option<&str>,
    email: &str,
    error: Option<&str>,
) -> Response {
    let text = i18n::login(lang);
    let action = match redirect {
        Some(redirect) if !redirect.is_empty() => with_query(LOGIN_PATH, "redirect", redirect),
        _ => LOGIN_PATH.to_string(),
    };

    let sso_links = PROVIDER_NAMES
        .iter()
        .filter_map(|name| {
            let url = authorize_url(&state.config, name)?;
            let label = match *name {
                "github" => text.button_login_github,
                "slack" => text.button_login_slack,
                "google" => text.button_login_google,
                _ => text.button_login_microsoft,
            };
            Some(SsoLink { label, url })
        })
        .collect();

    let form = LoginForm {
        action: &action,
        email,
        error,
        sso_links,
    };
    page(html::login(lang, &form, &state.config.hosts.website))
}
