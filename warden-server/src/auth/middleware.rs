use crate::auth::request_token;
use crate::context::RequestContext;
use crate::db::models::{normalize_name, Member, Organization};
use crate::db::{clients, organizations, StoreError};
use crate::errors::ApiError;
use crate::state::AppState;
use crate::tasks::Task;
use crate::token::Claims;
use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use log::{debug, warn};
use std::sync::Arc;
use warden_scope::Scope;

/// Header naming the organization a request acts on
pub const ORGANIZATION_HEADER: &str = "Organization";

/// Access requirements of a protected route
#[derive(Debug, Clone, Default)]
pub struct Guard {
    organization: bool,
    expert: bool,
    write: bool,
    scopes: Vec<Scope>,
}

impl Guard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the organization from the `Organization` header
    pub fn organization(mut self) -> Self {
        self.organization = true;
        self
    }

    /// Only expert organizations, implies [`Guard::organization`]
    pub fn expert(mut self) -> Self {
        self.organization = true;
        self.expert = true;
        self
    }

    /// Read-only members are rejected, implies [`Guard::organization`]
    pub fn write(mut self) -> Self {
        self.organization = true;
        self.write = true;
        self
    }

    pub fn scopes(mut self, scopes: impl IntoIterator<Item = Scope>) -> Self {
        self.scopes.extend(scopes);
        self
    }
}

/// Outcome of resolving the organization of a request
enum Resolved {
    Found(Organization, Option<Member>),
    Rejected,
}

pub(crate) async fn auth_middleware(
    State((state, guard)): State<(AppState, Arc<Guard>)>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = request_token(request.headers(), &state.config.cookie.name) else {
        debug!("Rejecting {} {}: no token", request.method(), request.uri());
        return ApiError::unauthorized().into_response();
    };

    let claims = match state.tokens.decode(token) {
        Ok(claims) => claims,
        Err(e) => {
            debug!("Rejecting {} {}: {}", request.method(), request.uri(), e);
            return ApiError::unauthorized().into_response();
        }
    };

    let (organization, member) = if guard.organization {
        let name = request
            .headers()
            .get(ORGANIZATION_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        match resolve_organization(&state, &claims, name).await {
            Ok(Resolved::Found(organization, member)) => (Some(organization), member),
            Ok(Resolved::Rejected) => {
                debug!("Organization '{}' not accessible for subject {}", name, claims.sub);
                return ApiError::unauthorized().into_response();
            }
            Err(e) => return ApiError::from(e).into_response(),
        }
    } else {
        (None, None)
    };

    let ctx = RequestContext::new(&claims, organization, member);
    let not_expert = guard.expert
        && !ctx
            .organization
            .as_ref()
            .is_some_and(|organization| organization.expert);

    if !ctx.has_scopes(&guard.scopes)
        || not_expert
        || (guard.write && !ctx.has_write_permission())
    {
        warn!(
            "Access to {} {} denied for subject {}",
            request.method(),
            request.uri(),
            claims.sub
        );
        return ApiError::forbidden().into_response();
    }

    touch_member_seen(&state, &ctx).await;
    request.extensions_mut().insert(ctx);
    next.run(request).await
}

/// Users must be members of the organization, clients must be registered for it unless trusted
async fn resolve_organization(
    state: &AppState,
    claims: &Claims,
    name: &str,
) -> Result<Resolved, StoreError> {
    let pool = state.db.pool();
    let Some(organization) =
        organizations::find_by_normalized_name(pool, &normalize_name(name)).await?
    else {
        return Ok(Resolved::Rejected);
    };

    if claims.is_client() {
        if claims.trusted {
            return Ok(Resolved::Found(organization, None));
        }

        let client_id = claims.client_id.as_deref().unwrap_or_default();
        let registered = clients::find_by_client_id(pool, client_id)
            .await?
            .is_some_and(|client| client.organization_id == Some(organization.id));

        return Ok(if registered {
            Resolved::Found(organization, None)
        } else {
            Resolved::Rejected
        });
    }

    match organizations::find_member(pool, organization.id, claims.sub).await? {
        Some(member) => Ok(Resolved::Found(organization, Some(member))),
        None => Ok(Resolved::Rejected),
    }
}

/// Queues a last seen update for members of expert organizations, at most once a day
async fn touch_member_seen(state: &AppState, ctx: &RequestContext) {
    let (Some(organization), Some(member)) = (&ctx.organization, &ctx.member) else {
        return;
    };
    if !organization.expert {
        return;
    }

    let today = Utc::now().date_naive();
    if member
        .last_seen
        .is_some_and(|last_seen| last_seen.date_naive() >= today)
    {
        return;
    }

    let key = (member.id, today);
    if state.seen.contains_key(&key) {
        return;
    }
    state.seen.insert(key, ()).await;
    state.tasks.enqueue(Task::TouchMemberSeen {
        member_id: member.id,
    });
}
