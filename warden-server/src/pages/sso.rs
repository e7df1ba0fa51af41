use super::i18n::{self, Lang};
use super::{found, html, page, with_cookie};
use crate::db::models::User;
use crate::db::users::{self, SsoProfile};
use crate::state::AppState;
use crate::tasks::Task;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use chrono::Utc;
use http::HeaderMap;
use log::{debug, error, info};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct CallbackParams {
    code: String,
}

/// Callback of a provider: signs the account in and lands on the website
pub(super) async fn sso_handler(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    let lang = Lang::from_headers(&headers);
    let name = provider.to_lowercase();

    match sign_in(&state, &name, &params.code).await {
        Ok((user, cookie)) => {
            info!("User {} signed in with {}", user.id, name);
            let target = format!(
                "{}/organizations",
                state.config.hosts.website.trim_end_matches('/')
            );
            with_cookie(found(&target), &cookie)
        }
        Err(reason) => {
            error!("Single sign-on with '{}' failed: {}", name, reason);
            page(html::message(
                lang,
                i18n::sso_error(lang),
                &state.config.hosts.website,
            ))
        }
    }
}

/// Runs the provider exchange and returns the user with a session cookie
async fn sign_in(state: &AppState, name: &str, code: &str) -> Result<(User, String), String> {
    let provider = state
        .sso
        .get(name)
        .ok_or_else(|| "provider is unknown or not configured".to_string())?;

    let token = provider.get_token(code).await.map_err(|e| e.to_string())?;
    let account = provider.get_user(&token).await.map_err(|e| e.to_string())?;
    let (firstname, lastname) = account.split_name();
    debug!("Provider {} reported account {}", name, account.id);

    let profile = SsoProfile {
        provider: name,
        provider_user_id: &account.id,
        email: &account.email,
        firstname,
        lastname,
        picture_url: account.picture.as_deref(),
    };
    let user = users::upsert_sso_user(state.db.pool(), &profile, Utc::now())
        .await
        .map_err(|e| e.to_string())?;

    let issued = state
        .tokens
        .issue(user.id, &user.language, Vec::new(), true)
        .map_err(|e| e.to_string())?;
    state.tasks.enqueue(Task::RecordLogin { user_id: user.id });

    let cookie = state
        .config
        .cookie
        .session(&issued.token, issued.expires_in());
    Ok((user, cookie))
}
