use crate::scope::Scope;
use std::collections::HashMap;

/// Scopes held by a caller, keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeSet {
    scopes: HashMap<String, Scope>,
}

impl ScopeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the set from the scope strings embedded in a token.
    ///
    /// Entries that are not `name:r` or `name:rw` with a registered name, or that ask for access
    /// the registry does not permit, are dropped.
    pub fn from_token<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let scopes = entries
            .into_iter()
            .filter_map(|entry| Scope::from_token_entry(entry.as_ref()))
            .map(|scope| (scope.name.clone(), scope))
            .collect();
        Self { scopes }
    }

    pub fn insert(&mut self, scope: Scope) {
        self.scopes.insert(scope.name.clone(), scope);
    }

    pub fn get(&self, name: &str) -> Option<&Scope> {
        self.scopes.get(name)
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.values()
    }

    /// Returns true if every required scope is held with identical read and write flags.
    ///
    /// Holding `rw` does not satisfy a requirement for `r`. An empty requirement list is never
    /// satisfied.
    pub fn satisfies(&self, required: &[Scope]) -> bool {
        !required.is_empty()
            && required.iter().all(|wanted| {
                self.scopes
                    .get(&wanted.name)
                    .is_some_and(|held| held.read == wanted.read && held.write == wanted.write)
            })
    }
}

impl FromIterator<Scope> for ScopeSet {
    fn from_iter<T: IntoIterator<Item = Scope>>(iter: T) -> Self {
        let mut set = Self::new();
        for scope in iter {
            set.insert(scope);
        }
        set
    }
}
