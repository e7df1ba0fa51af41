//! # warden-scope
//!
//! The scope vocabulary shared by the authorization pages and the API middleware.
//!
//! ## Components
//!
//! - **Registry:** The compiled-in catalog of scopes clients may ask for.
//! - **Scope:** A scope name with read/write flags and its wire encoding (`name`, `name:r`, `name:rw`).
//! - **Request:** Strict, all-or-nothing parsing of the `scope` parameter of an authorization request.
//! - **ScopeSet:** Lenient parsing of the scopes embedded in a token and the exact-match check.
//! - **Provision:** Validation of the scopes assigned to a newly registered API client.

pub mod error;
pub mod provision;
pub mod registry;
pub mod request;
pub mod scope;
pub mod set;

pub use crate::error::ScopeError;
pub use crate::provision::{normalize_provisioned, ProvisionedScope};
pub use crate::registry::{lookup, ScopeDefinition};
pub use crate::request::{parse_requested, RequestedScope};
pub use crate::scope::Scope;
pub use crate::set::ScopeSet;
