//! Replacement of a temporary password after the first login.

use super::i18n::{self, Lang};
use super::login::RedirectQuery;
use super::{html, login_redirect, page, redirect_to_login, server_error};
use crate::auth::{hash_new_password, session_user, verify_password, MIN_PASSWORD_LENGTH};
use crate::db::models::User;
use crate::db::users;
use crate::state::AppState;
use axum::extract::{OriginalUri, Query, State};
use axum::response::Response;
use axum::Form;
use http::{HeaderMap, Uri};
use log::{error, info};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct PasswordResetForm {
    oldpwd: String,
    newpwd1: String,
    newpwd2: String,
}

/// Validation failures, checked in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResetError {
    Input,
    Match,
    Rules,
    Password,
}

impl ResetError {
    fn message(self, text: &i18n::PasswordResetText) -> &'static str {
        match self {
            ResetError::Input => text.input_err,
            ResetError::Match => text.match_err,
            ResetError::Rules => text.password_rules_err,
            ResetError::Password => text.password_err,
        }
    }
}

fn current(uri: &Uri) -> &str {
    uri.path_and_query()
        .map(|path_and_query| path_and_query.as_str())
        .unwrap_or(super::PASSWORD_RESET_PATH)
}

async fn logged_in(state: &AppState, headers: &HeaderMap) -> Result<Option<User>, Response> {
    match session_user(state, headers).await {
        Ok(session) => Ok(session.map(|(user, _)| user)),
        Err(e) => {
            error!("Failed to resolve session user: {}", e);
            Err(server_error())
        }
    }
}

pub(super) async fn password_reset_page_handler(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Response {
    let lang = Lang::from_headers(&headers);

    match logged_in(&state, &headers).await {
        Ok(Some(_)) => render(&state, lang, &uri, None),
        Ok(None) => redirect_to_login(current(&uri)),
        Err(response) => response,
    }
}

pub(super) async fn password_reset_submit_handler(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Query(query): Query<RedirectQuery>,
    Form(form): Form<PasswordResetForm>,
) -> Response {
    let lang = Lang::from_headers(&headers);

    let mut user = match logged_in(&state, &headers).await {
        Ok(Some(user)) => user,
        Ok(None) => return redirect_to_login(current(&uri)),
        Err(response) => return response,
    };

    if let Err(reset_error) = validate(&user, &form).await {
        return render(&state, lang, &uri, Some(reset_error));
    }

    let Some(hash) = hash_new_password(user.id, form.newpwd1).await else {
        return server_error();
    };

    if let Err(e) = users::update_password(state.db.pool(), user.id, &hash).await {
        error!("Failed to store new password of user {}: {}", user.id, e);
        return server_error();
    }
    info!("User {} replaced the temporary password", user.id);

    user.reset_password = false;
    login_redirect(&state, lang, &user, query.redirect.as_deref())
}

async fn validate(user: &User, form: &PasswordResetForm) -> Result<(), ResetError> {
    if form.oldpwd.is_empty() || form.newpwd1.is_empty() || form.newpwd2.is_empty() {
        return Err(ResetError::Input);
    }
    if form.newpwd1 != form.newpwd2 {
        return Err(ResetError::Match);
    }
    if form.newpwd1.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ResetError::Rules);
    }
    if !verify_password(user, &form.oldpwd).await {
        return Err(ResetError::Password);
    }

    Ok(())
}

fn render(state: &AppState, lang: Lang, uri: &Uri, error: Option<ResetError>) -> Response {
    let text = i18n::password_reset(lang);
    page(html::password_reset(
        lang,
        current(uri),
        error.map(|error| error.message(text)),
        &state.config.hosts.website,
    ))
}
