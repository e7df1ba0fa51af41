//! Compiled-in scope catalog.
//!
//! The registry never changes at runtime. Every scope a client may request, and every scope
//! the API middleware may check, must have an entry here.

/// Definition of a single scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeDefinition {
    /// Name used on the wire, e.g. `articles`
    pub name: &'static str,
    /// Whether a client may be granted read access
    pub allows_read: bool,
    /// Whether a client may be granted write access
    pub allows_write: bool,
    /// Whether `name:value` is accepted on an authorization request
    pub allows_value: bool,
    description_en: &'static str,
    description_de: &'static str,
}

impl ScopeDefinition {
    const fn read_only(
        name: &'static str,
        allows_value: bool,
        description_en: &'static str,
        description_de: &'static str,
    ) -> Self {
        Self {
            name,
            allows_read: true,
            allows_write: false,
            allows_value,
            description_en,
            description_de,
        }
    }

    /// Human readable description shown on the consent page.
    ///
    /// German is returned for `de`, English for everything else.
    pub fn description(&self, language: &str) -> &'static str {
        match language {
            "de" => self.description_de,
            _ => self.description_en,
        }
    }
}

static REGISTRY: &[ScopeDefinition] = &[
    ScopeDefinition::read_only(
        "organization",
        false,
        "Read the organization name and settings",
        "Name und Einstellungen der Organisation lesen",
    ),
    ScopeDefinition::read_only(
        "language",
        false,
        "Read the languages of the organization",
        "Sprachen der Organisation lesen",
    ),
    ScopeDefinition::read_only(
        "articles",
        true,
        "Read articles",
        "Artikel lesen",
    ),
    ScopeDefinition::read_only(
        "article_authors",
        true,
        "Read the authors of articles",
        "Autoren von Artikeln lesen",
    ),
    ScopeDefinition::read_only(
        "article_authors_mails",
        true,
        "Read the email addresses of article authors",
        "E-Mail-Adressen der Autoren von Artikeln lesen",
    ),
    ScopeDefinition::read_only(
        "article_history",
        true,
        "Read the history of articles",
        "Historie von Artikeln lesen",
    ),
    ScopeDefinition::read_only("lists", true, "Read lists", "Listen lesen"),
    ScopeDefinition::read_only("tags", true, "Read tags", "Tags lesen"),
    ScopeDefinition::read_only(
        "pinned",
        true,
        "Read pinned articles and lists",
        "Angeheftete Artikel und Listen lesen",
    ),
    ScopeDefinition::read_only(
        "search_articles",
        true,
        "Search articles",
        "Artikel durchsuchen",
    ),
    ScopeDefinition::read_only("search_lists", true, "Search lists", "Listen durchsuchen"),
    ScopeDefinition::read_only("search_tags", true, "Search tags", "Tags durchsuchen"),
    ScopeDefinition::read_only(
        "search_all",
        true,
        "Search articles, lists and tags",
        "Artikel, Listen und Tags durchsuchen",
    ),
];

/// Looks up a scope definition by its exact name
pub fn lookup(name: &str) -> Option<&'static ScopeDefinition> {
    REGISTRY.iter().find(|definition| definition.name == name)
}

/// All registered scopes in catalog order
pub fn all() -> &'static [ScopeDefinition] {
    REGISTRY
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_lookup_known_scope() {
        let definition = lookup("articles").expect("articles is registered");
        assert_eq!(definition.name, "articles");
        assert!(definition.allows_read);
        assert!(!definition.allows_write);
        assert!(definition.allows_value);
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert!(lookup("Articles").is_none());
        assert!(lookup("unknown").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<_> = all().iter().map(|d| d.name).collect();
        assert_eq!(names.len(), all().len());
    }

    #[test]
    fn test_description_language_fallback() {
        let definition = lookup("tags").unwrap();
        assert_eq!(definition.description("de"), "Tags lesen");
        assert_eq!(definition.description("en"), "Read tags");
        assert_eq!(definition.description("fr"), "Read tags");
    }
}
