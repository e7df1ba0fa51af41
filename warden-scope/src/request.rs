//! Parsing of the `scope` parameter of an authorization request.

use crate::error::ScopeError;
use crate::registry::{self, ScopeDefinition};
use log::warn;
use std::fmt;

/// A scope requested by a client, optionally qualified with a value (`articles:r`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedScope {
    pub definition: &'static ScopeDefinition,
    pub value: String,
}

impl RequestedScope {
    pub fn name(&self) -> &'static str {
        self.definition.name
    }
}

/// Encodes as `name:value`, or the bare name when no value was requested
impl fmt::Display for RequestedScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_empty() {
            write!(f, "{}", self.definition.name)
        } else {
            write!(f, "{}:{}", self.definition.name, self.value)
        }
    }
}

/// Parses a space separated list of `name` or `name:value` entries.
///
/// The whole list is rejected if any entry is malformed, unknown, or carries a value its
/// definition does not accept. An empty parameter requests no scopes.
pub fn parse_requested(param: &str) -> Result<Vec<RequestedScope>, ScopeError> {
    if param.is_empty() {
        return Ok(Vec::new());
    }

    param.split(' ').map(parse_entry).collect()
}

fn parse_entry(entry: &str) -> Result<RequestedScope, ScopeError> {
    let parts: Vec<&str> = entry.split(':').collect();

    if parts.len() > 2 {
        warn!("Rejecting malformed scope '{}'", entry);
        return Err(ScopeError::Malformed(entry.to_string()));
    }

    let definition = registry::lookup(parts[0]).ok_or_else(|| {
        warn!("Rejecting unknown scope '{}'", entry);
        ScopeError::Unknown(parts[0].to_string())
    })?;

    let value = match parts.get(1) {
        Some(value) if !definition.allows_value => {
            warn!("Scope '{}' does not accept value '{}'", definition.name, value);
            return Err(ScopeError::ValueNotAllowed(definition.name.to_string()));
        }
        Some(value) => value.to_string(),
        None => String::new(),
    };

    Ok(RequestedScope { definition, value })
}
