use crate::db::models::{Member, Organization};
use crate::token::Claims;
use warden_scope::{Scope, ScopeSet};

/// Identity of the caller of a protected API route.
///
/// Built by the auth middleware and handed to handlers through request extensions.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub organization: Option<Organization>,
    pub member: Option<Member>,
    /// 0 for API clients
    pub user_id: i64,
    pub client_id: Option<String>,
    pub language: String,
    pub scopes: ScopeSet,
    pub trusted_client: bool,
}

impl RequestContext {
    pub fn new(
        claims: &Claims,
        organization: Option<Organization>,
        member: Option<Member>,
    ) -> Self {
        Self {
            organization,
            member,
            user_id: claims.sub,
            client_id: claims.client_id.clone(),
            language: claims.language.clone(),
            scopes: ScopeSet::from_token(&claims.scopes),
            trusted_client: claims.is_client() && claims.trusted,
        }
    }

    pub fn is_user(&self) -> bool {
        self.user_id != 0
    }

    pub fn is_client(&self) -> bool {
        !self.is_user()
    }

    /// Returns true if the caller may use a route requiring `required`.
    ///
    /// Users and trusted clients always pass. Other clients only pass on an expert
    /// organization and must hold every required scope with identical access flags.
    pub fn has_scopes(&self, required: &[Scope]) -> bool {
        if self.is_user() || self.trusted_client {
            return true;
        }

        match &self.organization {
            Some(organization) if organization.expert => self.scopes.satisfies(required),
            _ => false,
        }
    }

    /// Clients always have write permission, members only if they are not read-only
    pub fn has_write_permission(&self) -> bool {
        if self.is_client() {
            return true;
        }

        self.member.as_ref().is_some_and(|member| !member.read_only)
    }
}
