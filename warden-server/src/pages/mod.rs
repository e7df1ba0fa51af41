//! Browser-facing pages: authorization, login, logout, password reset and single sign-on.
//!
//! Pages never expose internal errors. Storage failures are logged and answered with a bare 500.

mod authorize;
mod html;
mod i18n;
mod login;
mod logout;
mod password_reset;
mod sso;

use crate::db::models::User;
use crate::headers::presets;
use crate::state::AppState;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use http::header::{LOCATION, SET_COOKIE};
use http::{HeaderValue, StatusCode};
use i18n::Lang;
use log::{error, warn};
use url::form_urlencoded;

/// Path of the password reset page
const PASSWORD_RESET_PATH: &str = "/passwordreset";
/// Path of the login page
const LOGIN_PATH: &str = "/login";

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/authorize",
            get(authorize::authorize_handler).post(authorize::authorize_handler),
        )
        .route(
            LOGIN_PATH,
            get(login::login_page_handler).post(login::login_submit_handler),
        )
        .route("/logout", get(logout::logout_handler))
        .route(
            PASSWORD_RESET_PATH,
            get(password_reset::password_reset_page_handler)
                .post(password_reset::password_reset_submit_handler),
        )
        .route("/sso/{provider}", get(sso::sso_handler))
}

/// A page that must never be cached or framed
fn render(status: StatusCode, html: String) -> Response {
    let mut response = (status, Html(html)).into_response();
    presets::auth_page().apply(&mut response);
    response
}

fn page(html: String) -> Response {
    render(StatusCode::OK, html)
}

fn server_error() -> Response {
    let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
    presets::auth_page().apply(&mut response);
    response
}

/// 302 to `location`
fn found(location: &str) -> Response {
    let mut response = StatusCode::FOUND.into_response();
    match HeaderValue::from_str(location) {
        Ok(value) => {
            response.headers_mut().insert(LOCATION, value);
        }
        Err(e) => {
            error!("Cannot redirect to {:?}: {}", location, e);
            return server_error();
        }
    }
    presets::auth_page().apply(&mut response);
    response
}

/// Adds a Set-Cookie header, a value that is not a valid header turns the response into a 500
fn with_cookie(mut response: Response, cookie: &str) -> Response {
    match HeaderValue::from_str(cookie) {
        Ok(value) => {
            response.headers_mut().append(SET_COOKIE, value);
            response
        }
        Err(e) => {
            error!("Invalid session cookie: {}", e);
            server_error()
        }
    }
}

/// `path` with a single query parameter, form encoded
fn with_query(path: &str, key: &str, value: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair(key, value)
        .finish();
    format!("{path}?{query}")
}

/// Redirect to the login page that returns to `target` afterwards
fn redirect_to_login(target: &str) -> Response {
    found(&with_query(LOGIN_PATH, "redirect", target))
}

/// Where a user goes after logging in or resetting the password.
///
/// Users that must change their password go to the reset page first. Otherwise an allowed
/// `redirect` is followed and everyone else sees the success page.
fn login_redirect(state: &AppState, lang: Lang, user: &User, redirect: Option<&str>) -> Response {
    let redirect = redirect.unwrap_or_default();

    if user.reset_password {
        return found(&with_query(PASSWORD_RESET_PATH, "redirect", redirect));
    }
    if !redirect.is_empty() {
        if state.config.hosts.is_allowed_redirect(redirect) {
            return found(redirect);
        }
        warn!("Ignoring redirect to foreign host {:?}", redirect);
    }

    page(html::message(
        lang,
        i18n::login_success(lang),
        &state.config.hosts.website,
    ))
}
