//! Token endpoint for API clients and token introspection.

use crate::auth::bearer_token;
use crate::db::clients;
use crate::errors::{ApiError, FieldError};
use crate::openapi::TOKEN_TAG;
use crate::state::AppState;
use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use http::{HeaderMap, StatusCode};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Header a client sends along with its token to have the token bound to it
pub const CLIENT_HEADER: &str = "Client";

const CLIENT_CREDENTIALS: &str = "client_credentials";

/// Credentials exchange of a registered client
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub(crate) struct TokenRequest {
    /// Must be `client_credentials`
    grant_type: String,
    client_id: String,
    client_secret: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub(crate) struct TokenResponse {
    token_type: String,
    access_token: String,
    /// Seconds until the token expires
    expires_in: i64,
}

/// Claims of a valid token
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub(crate) struct TokenInfo {
    expires_in: i64,
    scopes: Vec<String>,
    /// 0 for client tokens
    user_id: i64,
    language: String,
    client_id: Option<String>,
    trusted: bool,
    is_sso_user: bool,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/token",
    tag = TOKEN_TAG,
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Unsupported grant type"),
        (status = 401, description = "Unknown client or wrong secret"),
        (status = 500, description = "Internal server error")
    )
)]
pub(crate) async fn issue_token_handler(
    State(state): State<AppState>,
    Json(request): Json<TokenRequest>,
) -> Response {
    match issue_token(&state, &request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn issue_token(state: &AppState, request: &TokenRequest) -> Result<TokenResponse, ApiError> {
    if request.grant_type != CLIENT_CREDENTIALS {
        return Err(ApiError::validation(vec![FieldError::new(
            "grant_type",
            format!("Grant type '{}' is not supported", request.grant_type),
        )]));
    }

    let pool = state.db.pool();
    let Some(client) =
        clients::find_by_credentials(pool, &request.client_id, &request.client_secret).await?
    else {
        warn!("Rejected credentials of client '{}'", request.client_id);
        return Err(ApiError::unauthorized());
    };

    let scopes = clients::registered_scopes(pool, client.id)
        .await?
        .iter()
        .map(|scope| scope.token_entry())
        .collect();

    let issued = state
        .tokens
        .issue_client(&client.client_id, client.trusted, scopes)
        .map_err(|e| ApiError::internal(e.to_string()))?;
    info!("Issued token for client '{}'", client.client_id);

    Ok(TokenResponse {
        token_type: "Bearer".to_string(),
        expires_in: issued.expires_in(),
        access_token: issued.token,
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/token",
    tag = TOKEN_TAG,
    params(
        ("Authorization" = String, Header, description = "Bearer token to inspect"),
        ("Client" = Option<String>, Header, description = "Client id the token must belong to"),
    ),
    responses(
        (status = 200, description = "Token is valid", body = TokenInfo),
        (status = 401, description = "Token is missing, invalid, expired or bound to another client")
    )
)]
pub(crate) async fn token_info_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let Some(token) = bearer_token(&headers) else {
        return ApiError::unauthorized().into_response();
    };
    let Ok(claims) = state.tokens.decode(token) else {
        return ApiError::unauthorized().into_response();
    };

    if let Some(expected) = headers.get(CLIENT_HEADER) {
        let expected = expected.to_str().unwrap_or_default();
        if claims.client_id.as_deref() != Some(expected) {
            warn!("Token presented for client '{}' belongs to someone else", expected);
            return ApiError::unauthorized().into_response();
        }
    }

    let info = TokenInfo {
        expires_in: claims.expires_in(),
        user_id: claims.sub,
        language: claims.language,
        client_id: claims.client_id,
        trusted: claims.trusted,
        is_sso_user: claims.is_sso_user,
        scopes: claims.scopes,
    };
    (StatusCode::OK, Json(info)).into_response()
}

pub(super) fn router() -> Router<AppState> {
    Router::new().route(
        "/api/v1/auth/token",
        post(issue_token_handler).get(token_info_handler),
    )
}
