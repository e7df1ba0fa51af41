use super::i18n::{self, Lang};
use super::{found, html, page, with_cookie};
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::response::Response;
use http::HeaderMap;
use log::{debug, warn};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct LogoutParams {
    /// Accepted for compatibility, tokens can't be revoked before they expire
    token: Option<String>,
    redirect_uri: Option<String>,
}

/// Clears the session cookie, then redirects or shows the logout page
pub(super) async fn logout_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<LogoutParams>,
) -> Response {
    let lang = Lang::from_headers(&headers);
    if params.token.is_some() {
        debug!("Logout with explicit token, only the cookie is cleared");
    }

    let response = match params.redirect_uri.as_deref() {
        Some(target) if state.config.hosts.is_allowed_redirect(target) => found(target),
        other => {
            if let Some(target) = other.filter(|target| !target.is_empty()) {
                warn!("Ignoring logout redirect to foreign host {:?}", target);
            }
            page(html::message(
                lang,
                i18n::logout(lang),
                &state.config.hosts.website,
            ))
        }
    };

    with_cookie(response, &state.config.cookie.cleared())
}
