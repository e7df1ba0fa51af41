use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    #[error("Scope '{0}' is not registered")]
    Unknown(String),

    #[error("Scope '{0}' is malformed")]
    Malformed(String),

    #[error("Scope '{0}' does not accept a value")]
    ValueNotAllowed(String),

    #[error("Scope '{0}' does not permit read access")]
    ReadNotAllowed(String),

    #[error("Scope '{0}' does not permit write access")]
    WriteNotAllowed(String),
}
