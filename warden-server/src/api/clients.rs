//! Management of the API clients of an expert organization.

use crate::context::RequestContext;
use crate::db::models::{Client, GrantedScope};
use crate::db::{clients, with_deadline, StoreError};
use crate::errors::{ApiError, FieldError};
use crate::openapi::CLIENTS_TAG;
use crate::state::AppState;
use axum::extract::{Extension, Json, Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::Router;
use http::StatusCode;
use log::info;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::ToSchema;
use warden_scope::{normalize_provisioned, ProvisionedScope};

const MAX_NAME_LENGTH: usize = 40;
const CLIENT_ID_LENGTH: usize = 20;
const CLIENT_SECRET_LENGTH: usize = 64;

/// A registered client, the secret is only returned on creation
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub(crate) struct ClientResponse {
    id: i64,
    name: String,
    client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_secret: Option<String>,
    redirect_uri: Option<String>,
    /// Token entries of the granted scopes, e.g. `articles:r`
    scopes: Vec<String>,
}

impl ClientResponse {
    fn new(client: Client, scopes: &[GrantedScope]) -> Self {
        Self {
            id: client.id,
            name: client.name,
            client_id: client.client_id,
            client_secret: None,
            redirect_uri: client.redirect_uri,
            scopes: scopes.iter().map(GrantedScope::token_entry).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub(crate) struct CreateClient {
    name: String,
    /// Required for clients that use `/authorize`
    #[serde(default)]
    redirect_uri: Option<String>,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    scopes: Vec<ProvisionedScope>,
}

fn organization_id(ctx: &RequestContext) -> Result<i64, ApiError> {
    ctx.organization
        .as_ref()
        .map(|organization| organization.id)
        .ok_or_else(ApiError::unauthorized)
}

#[utoipa::path(
    get,
    path = "/api/v1/clients",
    tag = CLIENTS_TAG,
    params(
        ("Authorization" = String, Header, description = "Bearer token"),
        ("Organization" = String, Header, description = "Name of the organization"),
    ),
    responses(
        (status = 200, description = "Clients of the organization", body = [ClientResponse]),
        (status = 401, description = "Not authenticated for this organization"),
        (status = 403, description = "Organization is not on the expert tier")
    )
)]
pub(crate) async fn list_clients_handler(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Response {
    match list_clients(&state, &ctx).await {
        Ok(clients) => (StatusCode::OK, Json(clients)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn list_clients(state: &AppState, ctx: &RequestContext) -> Result<Vec<ClientResponse>, ApiError> {
    let pool = state.db.pool();
    let mut response = Vec::new();

    for client in clients::list_for_organization(pool, organization_id(ctx)?).await? {
        let scopes = clients::registered_scopes(pool, client.id).await?;
        response.push(ClientResponse::new(client, &scopes));
    }

    Ok(response)
}

#[utoipa::path(
    post,
    path = "/api/v1/clients",
    tag = CLIENTS_TAG,
    request_body = CreateClient,
    params(
        ("Authorization" = String, Header, description = "Bearer token"),
        ("Organization" = String, Header, description = "Name of the organization"),
    ),
    responses(
        (status = 201, description = "Client registered, the response carries its secret", body = ClientResponse),
        (status = 400, description = "Invalid name, redirect uri or scopes"),
        (status = 401, description = "Not authenticated for this organization"),
        (status = 403, description = "No write permission or not on the expert tier")
    )
)]
pub(crate) async fn create_client_handler(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<CreateClient>,
) -> Response {
    match create_client(&state, &ctx, &request).await {
        Ok(client) => (StatusCode::CREATED, Json(client)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn create_client(
    state: &AppState,
    ctx: &RequestContext,
    request: &CreateClient,
) -> Result<ClientResponse, ApiError> {
    let organization_id = organization_id(ctx)?;
    let pool = state.db.pool();
    let mut errors = Vec::new();

    let name = request.name.trim();
    if name.is_empty() {
        errors.push(FieldError::new("name", "Name must not be empty"));
    } else if name.chars().count() > MAX_NAME_LENGTH {
        errors.push(FieldError::new(
            "name",
            format!("Name must not be longer than {MAX_NAME_LENGTH} characters"),
        ));
    } else if clients::find_by_organization_and_name(pool, organization_id, name)
        .await?
        .is_some()
    {
        errors.push(FieldError::new("name", "A client with this name already exists"));
    }

    let redirect_uri = match request.redirect_uri.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url.to_string()),
            _ => {
                errors.push(FieldError::new("redirect_uri", "Redirect uri is not a valid URL"));
                None
            }
        },
    };

    let scopes: Vec<GrantedScope> = match normalize_provisioned(&request.scopes) {
        Ok(scopes) => scopes.iter().map(GrantedScope::from).collect(),
        Err(e) => {
            errors.push(FieldError::new("scopes", e));
            Vec::new()
        }
    };

    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }

    let client_id = random_string(CLIENT_ID_LENGTH);
    let client_secret = random_string(CLIENT_SECRET_LENGTH);
    let new_client = clients::NewClient {
        organization_id: Some(organization_id),
        name,
        client_id: &client_id,
        client_secret: &client_secret,
        redirect_uri: redirect_uri.as_deref(),
        trusted: false,
    };

    let id = with_deadline(state.config.database.transaction_deadline(), async {
        let mut tx = pool.begin().await?;
        let id = clients::insert(&mut tx, &new_client, &scopes).await?;
        tx.commit().await?;
        Ok::<_, StoreError>(id)
    })
    .await?;
    info!(
        "Registered client '{}' for organization {}",
        client_id, organization_id
    );

    Ok(ClientResponse {
        id,
        name: name.to_string(),
        client_id,
        client_secret: Some(client_secret),
        redirect_uri,
        scopes: scopes.iter().map(GrantedScope::token_entry).collect(),
    })
}

fn random_string(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

#[utoipa::path(
    delete,
    path = "/api/v1/clients/{id}",
    tag = CLIENTS_TAG,
    params(
        ("id" = i64, Path, description = "Row id of the client"),
        ("Authorization" = String, Header, description = "Bearer token"),
        ("Organization" = String, Header, description = "Name of the organization"),
    ),
    responses(
        (status = 204, description = "Client deleted together with its grants and scopes"),
        (status = 401, description = "Not authenticated for this organization"),
        (status = 403, description = "No write permission or not on the expert tier"),
        (status = 404, description = "No such client in this organization")
    )
)]
pub(crate) async fn delete_client_handler(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<i64>,
) -> Response {
    match delete_client(&state, &ctx, id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

async fn delete_client(state: &AppState, ctx: &RequestContext, id: i64) -> Result<(), ApiError> {
    let organization_id = organization_id(ctx)?;

    let deleted = with_deadline(state.config.database.transaction_deadline(), async {
        let mut tx = state.db.pool().begin().await?;
        let deleted = clients::delete(&mut tx, organization_id, id).await?;
        tx.commit().await?;
        Ok::<_, StoreError>(deleted)
    })
    .await?;

    if !deleted {
        return Err(ApiError::not_found(format!("Client {id} not found")));
    }
    info!("Deleted client {} of organization {}", id, organization_id);
    Ok(())
}

/// Routes open to every caller of an expert organization
pub(super) fn read_router() -> Router<AppState> {
    Router::new().route("/api/v1/clients", get(list_clients_handler))
}

/// Routes that also need write permission
pub(super) fn write_router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/clients", post(create_client_handler))
        .route("/api/v1/clients/{id}", delete(delete_client_handler))
}

#[cfg(test)]
mod tests {
    use super::ClientResponse;
    use crate::db::models::User;
    use crate::db::{clients, grants};
    use crate::test_utils::{seed, TestFixture};
    use http::StatusCode;
    use serde_json::json;

    const REDIRECT_URI: &str = "https://app.example.com/callback";

    async fn expert_member(fixture: &TestFixture, read_only: bool) -> User {
        let user = seed::user(&fixture.state.db, "jane@example.com", "secret-password").await;
        let organization = seed::organization(&fixture.state.db, "Acme", true).await;
        seed::member(&fixture.state.db, organization.id, user.id, read_only).await;
        user
    }

    #[tokio::test]
    async fn test_create_and_list_clients() {
        let fixture = TestFixture::new().await;
        let user = expert_member(&fixture, false).await;
        let bearer = fixture.bearer(&user);
        let headers = [("Authorization", bearer.as_str()), ("Organization", "acme")];

        let request = json!({
            "name": "  Reader ",
            "redirect_uri": REDIRECT_URI,
            "scopes": [
                { "name": "Articles", "read": true },
                { "name": "tags" },
                { "name": "organization", "read": true },
            ],
        });
        let response = fixture.post_json("/api/v1/clients", &request, &headers).await;
        response.assert_status(StatusCode::CREATED);

        let created = response.json_as::<ClientResponse>();
        assert_eq!(created.name, "Reader");
        assert_eq!(created.client_id.len(), 20);
        assert!(created.client_id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(created.client_secret.as_ref().map(String::len), Some(64));
        assert_eq!(created.scopes, vec!["articles:r", "organization:r"]);

        let response = fixture.get_with_headers("/api/v1/clients", &headers).await;
        response.assert_ok();
        let listed = response.json_as::<Vec<ClientResponse>>();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].client_id, created.client_id);
        assert_eq!(listed[0].client_secret, None);
        assert_eq!(listed[0].redirect_uri.as_deref(), Some(REDIRECT_URI));

        // the new client can exchange its credentials right away
        let response = fixture
            .post_json(
                "/api/v1/auth/token",
                &json!({
                    "grant_type": "client_credentials",
                    "client_id": created.client_id,
                    "client_secret": created.client_secret,
                }),
                &[],
            )
            .await;
        response.assert_ok();
    }

    #[tokio::test]
    async fn test_create_collects_all_errors() {
        let fixture = TestFixture::new().await;
        let user = expert_member(&fixture, false).await;
        let bearer = fixture.bearer(&user);
        let headers = [("Authorization", bearer.as_str()), ("Organization", "acme")];

        let request = json!({
            "name": "x".repeat(41),
            "redirect_uri": "not a url",
            "scopes": [{ "name": "articles", "read": true, "write": true }],
        });
        let response = fixture.post_json("/api/v1/clients", &request, &headers).await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let fields: Vec<&str> = response.json["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|error| error["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["name", "redirect_uri", "scopes"]);

        let request = json!({ "name": "", "scopes": [{ "name": "unknown", "read": true }] });
        let response = fixture.post_json("/api/v1/clients", &request, &headers).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json["detail"], "Name must not be empty");
        assert_eq!(
            response.json["errors"][1]["detail"],
            "Scope 'unknown' is not registered"
        );
    }

    #[tokio::test]
    async fn test_duplicate_name_is_rejected() {
        let fixture = TestFixture::new().await;
        let user = expert_member(&fixture, false).await;
        let bearer = fixture.bearer(&user);
        let headers = [("Authorization", bearer.as_str()), ("Organization", "acme")];
        let request = json!({ "name": "Reader" });

        let response = fixture.post_json("/api/v1/clients", &request, &headers).await;
        response.assert_status(StatusCode::CREATED);

        let response = fixture.post_json("/api/v1/clients", &request, &headers).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json["errors"][0]["field"], "name");
    }

    #[tokio::test]
    async fn test_tier_and_write_permission() {
        let fixture = TestFixture::new().await;
        let user = expert_member(&fixture, true).await;
        let basic = seed::organization(&fixture.state.db, "Basic", false).await;
        seed::member(&fixture.state.db, basic.id, user.id, false).await;
        let bearer = fixture.bearer(&user);

        // read-only members of an expert organization may list but not create
        let headers = [("Authorization", bearer.as_str()), ("Organization", "acme")];
        fixture
            .get_with_headers("/api/v1/clients", &headers)
            .await
            .assert_ok();
        fixture
            .post_json("/api/v1/clients", &json!({ "name": "Reader" }), &headers)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let headers = [("Authorization", bearer.as_str()), ("Organization", "basic")];
        fixture
            .get_with_headers("/api/v1/clients", &headers)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        fixture
            .get_with_headers("/api/v1/clients", &[])
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_delete_cascades_grants_and_scopes() {
        let fixture = TestFixture::new().await;
        let user = expert_member(&fixture, false).await;
        let organization = seed::organization(&fixture.state.db, "Other", true).await;
        let acme = crate::db::organizations::find_by_normalized_name(fixture.state.db.pool(), "acme")
            .await
            .unwrap()
            .unwrap();
        let client = seed::client(
            &fixture.state.db,
            Some(acme.id),
            "reader",
            REDIRECT_URI,
            false,
            &[("articles", "r")],
        )
        .await;
        let foreign = seed::client(
            &fixture.state.db,
            Some(organization.id),
            "foreign",
            REDIRECT_URI,
            false,
            &[],
        )
        .await;
        seed::grant(&fixture.state.db, user.id, client.id, &[("articles", "")]).await;
        let bearer = fixture.bearer(&user);
        let headers = [("Authorization", bearer.as_str()), ("Organization", "acme")];

        let response = fixture
            .delete_with_headers(&format!("/api/v1/clients/{}", foreign.id), &headers)
            .await;
        response.assert_status(StatusCode::NOT_FOUND);

        let response = fixture
            .delete_with_headers(&format!("/api/v1/clients/{}", client.id), &headers)
            .await;
        response.assert_status(StatusCode::NO_CONTENT);

        let pool = fixture.state.db.pool();
        assert!(clients::find_by_client_id(pool, "reader").await.unwrap().is_none());
        assert!(!grants::has_grant(pool, user.id, client.id).await.unwrap());
        assert!(grants::granted_scopes(pool, user.id, client.id)
            .await
            .unwrap()
            .is_empty());
        assert!(clients::registered_scopes(pool, client.id).await.unwrap().is_empty());
        assert!(clients::find_by_client_id(pool, "foreign").await.unwrap().is_some());
    }
}
