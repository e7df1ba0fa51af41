use crate::context::RequestContext;
use crate::errors::ApiError;
use crate::openapi::ORGANIZATION_TAG;
use crate::state::AppState;
use axum::extract::{Extension, Json};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub(crate) struct OrganizationResponse {
    id: i64,
    name: String,
    expert: bool,
    /// Whether the caller may change data of the organization
    writable: bool,
}

/// The organization selected by the `Organization` header
#[utoipa::path(
    get,
    path = "/api/v1/organization",
    tag = ORGANIZATION_TAG,
    params(
        ("Authorization" = String, Header, description = "Bearer token"),
        ("Organization" = String, Header, description = "Name of the organization"),
    ),
    responses(
        (status = 200, description = "The organization", body = OrganizationResponse),
        (status = 401, description = "Not authenticated for this organization"),
        (status = 403, description = "Missing scope organization:r")
    )
)]
pub(crate) async fn organization_handler(Extension(ctx): Extension<RequestContext>) -> Response {
    let Some(organization) = ctx.organization.as_ref() else {
        return ApiError::unauthorized().into_response();
    };

    let response = OrganizationResponse {
        id: organization.id,
        name: organization.name.clone(),
        expert: organization.expert,
        writable: ctx.has_write_permission(),
    };
    (StatusCode::OK, Json(response)).into_response()
}

pub(super) fn router() -> Router<AppState> {
    Router::new().route("/api/v1/organization", get(organization_handler))
}
