//! Validation of the scopes assigned to a newly registered API client.

use crate::error::ScopeError;
use crate::registry;
use crate::scope::Scope;
use serde::{Deserialize, Serialize};

/// A scope as submitted when registering a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionedScope {
    pub name: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub write: bool,
}

/// Normalizes and validates the scopes of a new client.
///
/// Entries without any access are skipped, names are lowercased, duplicates keep their first
/// occurrence and write access implies read access. Unknown names and access the registry does
/// not permit fail the whole list.
pub fn normalize_provisioned(scopes: &[ProvisionedScope]) -> Result<Vec<Scope>, ScopeError> {
    let mut normalized: Vec<Scope> = Vec::with_capacity(scopes.len());

    for requested in scopes {
        if !requested.read && !requested.write {
            continue;
        }

        let name = requested.name.to_lowercase();

        if normalized.iter().any(|scope| scope.name == name) {
            continue;
        }

        let definition =
            registry::lookup(&name).ok_or_else(|| ScopeError::Unknown(name.clone()))?;
        let scope = Scope::new(name, requested.read, requested.write);

        if scope.write && !definition.allows_write {
            return Err(ScopeError::WriteNotAllowed(scope.name));
        }
        if scope.read && !definition.allows_read {
            return Err(ScopeError::ReadNotAllowed(scope.name));
        }

        normalized.push(scope);
    }

    Ok(normalized)
}
