//! Account of the user a token was issued to.

use crate::auth::{hash_new_password, verify_password, MIN_PASSWORD_LENGTH};
use crate::context::RequestContext;
use crate::db::models::{User, LOCAL_PROVIDER};
use crate::db::users;
use crate::errors::{ApiError, FieldError};
use crate::openapi::USER_TAG;
use crate::state::AppState;
use axum::extract::{Extension, Json, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use http::StatusCode;
use log::info;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Longest first or last name in characters
const MAX_NAME_LENGTH: usize = 40;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub(crate) struct UserResponse {
    id: i64,
    email: String,
    firstname: Option<String>,
    lastname: Option<String>,
    language: String,
    picture_url: Option<String>,
    /// Signs in through a single sign-on provider and has no local password
    is_sso_user: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            is_sso_user: user.auth_provider != LOCAL_PROVIDER,
            id: user.id,
            email: user.email,
            firstname: user.firstname,
            lastname: user.lastname,
            language: user.language,
            picture_url: user.picture_url,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(default)]
pub(crate) struct PasswordChange {
    old_password: String,
    new_password: String,
    new_password_repeat: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(default)]
pub(crate) struct ProfileChange {
    firstname: String,
    lastname: String,
    /// Two letter language code, empty keeps the current language
    language: String,
}

/// Loads the user behind the token, client tokens have no user
async fn current_user(state: &AppState, ctx: &RequestContext) -> Result<User, ApiError> {
    if !ctx.is_user() {
        return Err(ApiError::forbidden());
    }

    users::find_by_id(state.db.pool(), ctx.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/user",
    tag = USER_TAG,
    params(("Authorization" = String, Header, description = "Bearer token of a user")),
    responses(
        (status = 200, description = "The user", body = UserResponse),
        (status = 401, description = "Token is missing or invalid"),
        (status = 403, description = "Token belongs to an API client"),
        (status = 404, description = "User no longer exists")
    )
)]
pub(crate) async fn get_user_handler(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Response {
    match current_user(&state, &ctx).await {
        Ok(user) => (StatusCode::OK, Json(UserResponse::from(user))).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/user/password",
    tag = USER_TAG,
    request_body = PasswordChange,
    params(("Authorization" = String, Header, description = "Bearer token of a user")),
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Missing input, passwords differ, too short or wrong old password"),
        (status = 401, description = "Token is missing or invalid"),
        (status = 403, description = "Client token or single sign-on account")
    )
)]
pub(crate) async fn update_password_handler(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(change): Json<PasswordChange>,
) -> Response {
    match update_password(&state, &ctx, change).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

async fn update_password(
    state: &AppState,
    ctx: &RequestContext,
    change: PasswordChange,
) -> Result<(), ApiError> {
    let user = current_user(state, ctx).await?;
    if user.auth_provider != LOCAL_PROVIDER {
        return Err(ApiError::new(
            "Single sign-on accounts have no password",
            StatusCode::FORBIDDEN,
        ));
    }

    if let Some(error) = check_password_change(&user, &change).await {
        return Err(ApiError::validation(vec![error]));
    }

    let Some(hash) = hash_new_password(user.id, change.new_password).await else {
        return Err(ApiError::internal("Failed to store the new password"));
    };
    users::update_password(state.db.pool(), user.id, &hash).await?;
    info!("User {} changed the password", user.id);

    Ok(())
}

/// Same order as the password reset page: input, match, rules, old password
async fn check_password_change(user: &User, change: &PasswordChange) -> Option<FieldError> {
    if change.old_password.is_empty() {
        return Some(FieldError::new("old_password", "Old password is required"));
    }
    if change.new_password.is_empty() {
        return Some(FieldError::new("new_password", "New password is required"));
    }
    if change.new_password != change.new_password_repeat {
        return Some(FieldError::new(
            "new_password_repeat",
            "The new passwords do not match",
        ));
    }
    if change.new_password.chars().count() < MIN_PASSWORD_LENGTH {
        return Some(FieldError::new(
            "new_password",
            format!("Password must have at least {MIN_PASSWORD_LENGTH} characters"),
        ));
    }
    if !verify_password(user, &change.old_password).await {
        return Some(FieldError::new("old_password", "Old password is wrong"));
    }

    None
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/user/data",
    tag = USER_TAG,
    request_body = ProfileChange,
    params(("Authorization" = String, Header, description = "Bearer token of a user")),
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Invalid name or language"),
        (status = 401, description = "Token is missing or invalid"),
        (status = 403, description = "Token belongs to an API client")
    )
)]
pub(crate) async fn update_profile_handler(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(change): Json<ProfileChange>,
) -> Response {
    match update_profile(&state, &ctx, change).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn update_profile(
    state: &AppState,
    ctx: &RequestContext,
    change: ProfileChange,
) -> Result<UserResponse, ApiError> {
    let user = current_user(state, ctx).await?;

    let firstname = change.firstname.trim();
    let lastname = change.lastname.trim();
    let language = change.language.trim().to_lowercase();

    let mut errors = Vec::new();
    for (field, value) in [("firstname", firstname), ("lastname", lastname)] {
        let length = value.chars().count();
        if length == 0 || length > MAX_NAME_LENGTH {
            errors.push(FieldError::new(
                field,
                format!("Must have between 1 and {MAX_NAME_LENGTH} characters"),
            ));
        }
    }
    if !language.is_empty()
        && !(language.len() == 2 && language.chars().all(|c| c.is_ascii_alphabetic()))
    {
        errors.push(FieldError::new("language", "Must be a two letter language code"));
    }
    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }

    let language = if language.is_empty() {
        user.language
    } else {
        language
    };
    let updated = users::update_profile(state.db.pool(), user.id, firstname, lastname, &language)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(UserResponse::from(updated))
}

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/auth/user", get(get_user_handler))
        .route("/api/v1/auth/user/password", post(update_password_handler))
        .route("/api/v1/auth/user/data", post(update_profile_handler))
}
