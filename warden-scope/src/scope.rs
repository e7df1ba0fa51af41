use crate::registry;
use std::fmt;

/// A scope with its access flags.
///
/// Write access always implies read access. A scope with neither flag encodes as the bare
/// name and grants nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scope {
    pub name: String,
    pub read: bool,
    pub write: bool,
}

impl Scope {
    pub fn new(name: impl Into<String>, read: bool, write: bool) -> Self {
        Self {
            name: name.into(),
            read: read || write,
            write,
        }
    }

    /// Read-only access to `name`
    pub fn read(name: impl Into<String>) -> Self {
        Self::new(name, true, false)
    }

    /// Read and write access to `name`
    pub fn read_write(name: impl Into<String>) -> Self {
        Self::new(name, true, true)
    }

    /// Parses a scope as stored in a token or a granted scope row.
    ///
    /// Only `name:r` and `name:rw` with a registered name, and access the registry permits for
    /// that name, are accepted. Anything else yields `None` so a single odd entry never
    /// invalidates the rest of a token.
    pub fn from_token_entry(entry: &str) -> Option<Self> {
        let (name, access) = entry.split_once(':')?;
        let definition = registry::lookup(name)?;

        match access {
            "r" if definition.allows_read => Some(Self::read(name)),
            "rw" if definition.allows_write => Some(Self::read_write(name)),
            _ => None,
        }
    }

    /// Access flag suffix as stored next to a granted scope (`r`, `rw` or empty)
    pub fn access(&self) -> &'static str {
        match (self.read, self.write) {
            (_, true) => "rw",
            (true, false) => "r",
            (false, false) => "",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.access() {
            "" => write!(f, "{}", self.name),
            access => write!(f, "{}:{}", self.name, access),
        }
    }
}
