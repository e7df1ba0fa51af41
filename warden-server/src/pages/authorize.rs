//! Implicit grant authorization.
//!
//! Parameters are always read from the query string, the consent form posts back to the very
//! same URL. Trusted clients and users with an existing grant skip the consent page.

use super::i18n::{self, Lang};
use super::{found, html, page, redirect_to_login, server_error, with_query, PASSWORD_RESET_PATH};
use crate::auth::session_user;
use crate::db::models::{Client, GrantedScope, User};
use crate::db::{clients, grants, with_deadline, StoreError};
use crate::state::AppState;
use crate::token::Claims;
use axum::extract::{OriginalUri, Query, State};
use axum::response::Response;
use http::{HeaderMap, Method};
use log::{debug, error, info, warn};
use serde::Deserialize;
use url::Url;
use warden_scope::{parse_requested, RequestedScope};

/// Token type reported to clients in the redirect
const TOKEN_TYPE: &str = "Bearer";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct AuthorizeParams {
    response_type: String,
    client_id: String,
    redirect_uri: String,
    scope: String,
    state: String,
}

/// A request that names a known client and only registered scopes
struct ValidRequest {
    client: Client,
    scopes: Vec<RequestedScope>,
}

pub(super) async fn authorize_handler(
    State(state): State<AppState>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Query(params): Query<AuthorizeParams>,
) -> Response {
    let lang = Lang::from_headers(&headers);

    let request = match validate(&state, &params).await {
        Ok(Some(request)) => request,
        Ok(None) => return client_unknown(&state, lang),
        Err(e) => {
            error!("Failed to look up client '{}': {}", params.client_id, e);
            return server_error();
        }
    };

    let current = uri
        .path_and_query()
        .map(|path_and_query| path_and_query.as_str())
        .unwrap_or("/authorize");

    let (user, claims) = match session_user(&state, &headers).await {
        Ok(Some(session)) => session,
        Ok(None) => return redirect_to_login(current),
        Err(e) => {
            error!("Failed to resolve session user: {}", e);
            return server_error();
        }
    };

    if user.reset_password {
        return found(&with_query(PASSWORD_RESET_PATH, "redirect", current));
    }

    let ValidRequest { client, scopes } = request;
    let requested: Vec<GrantedScope> = scopes.iter().map(GrantedScope::from).collect();

    if client.trusted {
        let entries = requested.iter().map(GrantedScope::token_entry).collect();
        return complete(&state, &client, &user, &claims, entries, &params.state);
    }

    let decision = match existing_grant(&state, &user, &client, &requested).await {
        Ok(decision) => decision,
        Err(e) => {
            error!(
                "Failed to read access grant of user {} for client {}: {}",
                user.id, client.id, e
            );
            return server_error();
        }
    };

    if let Grant::Covered(granted) = decision {
        let entries = granted.iter().map(GrantedScope::token_entry).collect();
        return complete(&state, &client, &user, &claims, entries, &params.state);
    }

    if method != Method::POST {
        return page(html::consent(
            lang,
            &client.name,
            current,
            &scopes,
            &state.config.hosts.website,
        ));
    }

    let replace = matches!(decision, Grant::Outdated);
    if let Err(e) = save_grant(&state, &user, &client, &requested, replace).await {
        error!(
            "Failed to save access grant of user {} for client {}: {}",
            user.id, client.id, e
        );
        return server_error();
    }
    info!("User {} granted access to client {}", user.id, client.client_id);

    let entries = requested.iter().map(GrantedScope::token_entry).collect();
    complete(&state, &client, &user, &claims, entries, &params.state)
}

/// Resolves the client and parses the requested scopes, `None` for any invalid parameter
async fn validate(
    state: &AppState,
    params: &AuthorizeParams,
) -> Result<Option<ValidRequest>, StoreError> {
    if params.response_type.to_lowercase() != "token"
        || params.client_id.is_empty()
        || params.redirect_uri.is_empty()
    {
        debug!("Incomplete authorization request for client '{}'", params.client_id);
        return Ok(None);
    }

    let redirect_uri = match Url::parse(&params.redirect_uri) {
        Ok(url) => url,
        Err(e) => {
            warn!("Could not parse redirect URI {:?}: {}", params.redirect_uri, e);
            return Ok(None);
        }
    };

    let Some(client) = clients::find_by_client_id_and_redirect_uri(
        state.db.pool(),
        &params.client_id,
        redirect_uri.as_str(),
    )
    .await?
    else {
        debug!(
            "No client '{}' with redirect URI {}",
            params.client_id, redirect_uri
        );
        return Ok(None);
    };

    match parse_requested(&params.scope) {
        Ok(scopes) => Ok(Some(ValidRequest { client, scopes })),
        Err(e) => {
            warn!("Rejecting scopes {:?}: {}", params.scope, e);
            Ok(None)
        }
    }
}

enum Grant {
    /// No consent given yet
    Missing,
    /// Consent given, the requested scopes exceed what was granted
    Outdated,
    /// Consent given, carries the scopes the user approved
    Covered(Vec<GrantedScope>),
}

async fn existing_grant(
    state: &AppState,
    user: &User,
    client: &Client,
    requested: &[GrantedScope],
) -> Result<Grant, StoreError> {
    let pool = state.db.pool();
    if !grants::has_grant(pool, user.id, client.id).await? {
        return Ok(Grant::Missing);
    }

    let granted = grants::granted_scopes(pool, user.id, client.id).await?;
    if state.config.reconsent_on_scope_change
        && !requested.iter().all(|scope| granted.contains(scope))
    {
        debug!(
            "Client {} asks user {} for scopes beyond the grant",
            client.client_id, user.id
        );
        return Ok(Grant::Outdated);
    }

    Ok(Grant::Covered(granted))
}

/// Stores grant and scopes in one transaction bounded by the transaction deadline
async fn save_grant(
    state: &AppState,
    user: &User,
    client: &Client,
    scopes: &[GrantedScope],
    replace: bool,
) -> Result<(), StoreError> {
    with_deadline(state.config.database.transaction_deadline(), async {
        let mut tx = state.db.pool().begin().await?;

        let grant = grants::create_grant(&mut *tx, user.id, client.id).await?;
        if replace {
            grants::replace_granted_scopes(&mut tx, grant, scopes).await?;
        } else {
            grants::create_granted_scopes(&mut tx, grant, scopes).await?;
        }

        tx.commit().await?;
        Ok::<_, StoreError>(())
    })
    .await
}

/// Issues the token and redirects back to the client
fn complete(
    state: &AppState,
    client: &Client,
    user: &User,
    claims: &Claims,
    scopes: Vec<String>,
    client_state: &str,
) -> Response {
    let issued = match state
        .tokens
        .issue(user.id, &user.language, scopes, claims.is_sso_user)
    {
        Ok(issued) => issued,
        Err(e) => {
            error!("Failed to issue token for user {}: {}", user.id, e);
            return server_error();
        }
    };

    let Some(mut redirect) = client
        .redirect_uri
        .as_deref()
        .and_then(|uri| Url::parse(uri).ok())
    else {
        error!("Client {} has no usable redirect URI", client.client_id);
        return server_error();
    };

    let mut pairs = Vec::new();
    if !client.trusted {
        pairs.push(("token_type", TOKEN_TYPE.to_string()));
        pairs.push(("expires_in", issued.expires_in().to_string()));
        pairs.push(("access_token", issued.token));
    }
    if !client_state.is_empty() {
        pairs.push(("state", client_state.to_string()));
    }
    if !pairs.is_empty() {
        redirect.query_pairs_mut().extend_pairs(pairs);
    }

    found(redirect.as_str())
}

fn client_unknown(state: &AppState, lang: Lang) -> Response {
    page(html::message(
        lang,
        i18n::client_unknown(lang),
        &state.config.hosts.website,
    ))
}
