pub(crate) mod clients;
pub(crate) mod health;
pub(crate) mod organization;
pub(crate) mod token;
pub(crate) mod user;

use crate::auth::middleware::{auth_middleware, Guard};
use crate::errors::ApiError;
use crate::state::AppState;
use axum::body::Body;
use axum::extract::State;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use http::{Request, StatusCode};
use log::warn;
use std::sync::Arc;
use warden_scope::Scope;

/// Combines all API routes into a single router
pub(super) fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(token::router())
        .merge(protected_routes(state))
}

/// Routes behind the auth middleware, each group with the requirements it enforces
fn protected_routes(state: &AppState) -> Router<AppState> {
    let organization_guard = Guard::new()
        .organization()
        .scopes([Scope::read("organization")]);

    Router::new()
        .merge(guarded(organization::router(), state, organization_guard))
        .merge(guarded(clients::read_router(), state, Guard::new().expert()))
        .merge(guarded(
            clients::write_router(),
            state,
            Guard::new().expert().write(),
        ))
        .merge(guarded(user::router(), state, Guard::new()))
}

// route_layer, so unmatched paths still answer 404 instead of 401
fn guarded(router: Router<AppState>, state: &AppState, guard: Guard) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(
        (state.clone(), Arc::new(guard)),
        auth_middleware,
    ))
}

/// Answers 408 once a request runs longer than the configured deadline.
///
/// The handler future is dropped on expiry, which also rolls back its open transaction.
pub(crate) async fn request_deadline_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let deadline = state.config.request_deadline();
    let path = request.uri().path().to_string();

    match tokio::time::timeout(deadline, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            warn!("Request to {} exceeded the deadline of {:?}", path, deadline);
            ApiError::new("Request deadline exceeded", StatusCode::REQUEST_TIMEOUT).into_response()
        }
    }
}
