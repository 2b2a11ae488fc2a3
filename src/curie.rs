//! Compact URI (CURIE) resolution.
//!
//! A CURIE definition binds a prefix name to a URI template:
//!
//! ```json
//! { "name": "acme", "href": "http://docs.acme.example/rels/{rel}", "templated": true }
//! ```
//!
//! With that definition the relation `acme:widgets` (or the bracketed safe
//! form `[acme:widgets]`) expands to `http://docs.acme.example/rels/widgets`.
//! Expansion never fails: a token whose prefix has no definition is kept
//! literally.

use std::fmt;

use indexmap::IndexMap;
use serde_json::{json, Value};

use crate::keys::CURIE_NAMES;
use crate::types::CurieDefinition;

/// Unique prefix name => name as declared in the source, for renamed prefixes.
pub type RenameMap = IndexMap<String, String>;

/// How a prefix's local part is turned into a full relation URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion {
    /// The token ends the template; the local part is appended to the base.
    Prefix(String),
    /// The token sits inside the template; the local part replaces it.
    Template { before: String, after: String },
}

impl Expansion {
    /// Build the expansion rule for a URI template.
    ///
    /// The first `{...}` expression is the substitution token. A template
    /// without one is treated as a plain prefix.
    pub fn parse(template: &str) -> Self {
        match find_token(template) {
            Some((start, end)) if end < template.len() => Expansion::Template {
                before: template[..start].to_string(),
                after: template[end..].to_string(),
            },
            Some((start, _)) => Expansion::Prefix(template[..start].to_string()),
            None => Expansion::Prefix(template.to_string()),
        }
    }

    pub fn expand(&self, local: &str) -> String {
        match self {
            Expansion::Prefix(base) => format!("{}{}", base, local),
            Expansion::Template { before, after } => format!("{}{}{}", before, local, after),
        }
    }

    /// Recover the local part from an expanded relation, if this rule produced it.
    pub fn contract<'a>(&self, expanded: &'a str) -> Option<&'a str> {
        let local = match self {
            Expansion::Prefix(base) => expanded.strip_prefix(base.as_str())?,
            Expansion::Template { before, after } => expanded
                .strip_prefix(before.as_str())?
                .strip_suffix(after.as_str())?,
        };
        (!local.is_empty()).then_some(local)
    }
}

fn find_token(template: &str) -> Option<(usize, usize)> {
    let start = template.find('{')?;
    let end = start + template[start..].find('}')? + 1;
    Some((start, end))
}

/// A relation name after CURIE resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRelation {
    /// Expanded URI, or the token as written if it could not be expanded.
    pub relation: String,
    /// The token was written in bracketed `[prefix:local]` form.
    pub safe_curie: bool,
}

/// A compact relation produced by [`PrefixTable::compact_relation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurieToken {
    pub prefix: String,
    pub local: String,
}

impl CurieToken {
    /// `prefix:local`
    pub fn plain(&self) -> String {
        format!("{}:{}", self.prefix, self.local)
    }

    /// Bracketed form when `safe` is set, plain form otherwise.
    pub fn render(&self, safe: bool) -> String {
        if safe {
            self.to_string()
        } else {
            self.plain()
        }
    }
}

impl fmt::Display for CurieToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}]", self.prefix, self.local)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    template: String,
    expansion: Expansion,
    declared_name: Option<String>,
    singular: bool,
    inherited: bool,
}

/// Prefix rules in scope for one document.
///
/// Scoped to a single decode or encode call. Nested documents start from
/// [`PrefixTable::inherit`] of their parent and may add or shadow prefixes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrefixTable {
    entries: IndexMap<String, Entry>,
}

/// Ingest source definitions (`name`, `template`) into a fresh table.
///
/// Returns the table and the renames applied to keep prefix names unique.
pub fn ingest_definitions<'a>(
    definitions: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> (PrefixTable, RenameMap) {
    let mut table = PrefixTable::new();
    table.ingest(definitions);
    let renames = table.renames();
    (table, renames)
}

impl PrefixTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A child scope: every current prefix stays resolvable but is not
    /// re-published by the child.
    pub fn inherit(&self) -> Self {
        let entries = self
            .entries
            .iter()
            .map(|(name, entry)| {
                let entry = Entry {
                    inherited: true,
                    ..entry.clone()
                };
                (name.clone(), entry)
            })
            .collect();
        Self { entries }
    }

    /// True if this scope declares prefixes of its own.
    pub fn has_own_definitions(&self) -> bool {
        self.entries.values().any(|entry| !entry.inherited)
    }

    /// Add source definitions to this scope.
    ///
    /// A name already declared in this scope is renamed (`acme` => `acme1`)
    /// and the rename recorded (see [`renames`](Self::renames)). A name only
    /// inherited from a parent scope is shadowed instead. Returns the
    /// canonical definitions in input order.
    pub fn ingest<'a>(
        &mut self,
        definitions: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Vec<CurieDefinition> {
        let mut added = Vec::new();

        for (declared, template) in definitions {
            let name = CURIE_NAMES.allocate(declared, |candidate| {
                self.entries
                    .get(candidate)
                    .is_some_and(|entry| !entry.inherited)
            });

            let mut definition = CurieDefinition::new(name.clone(), template);
            if name != declared {
                tracing::debug!(declared, renamed = %name, "duplicate CURIE prefix renamed");
                definition.declared_name = Some(declared.to_string());
            }

            self.insert(&definition);
            added.push(definition);
        }

        added
    }

    /// Add one canonical definition, replacing any inherited prefix of the same name.
    pub fn insert(&mut self, definition: &CurieDefinition) {
        self.entries.insert(
            definition.name.clone(),
            Entry {
                template: definition.template.clone(),
                expansion: Expansion::parse(&definition.template),
                declared_name: definition.declared_name.clone(),
                singular: definition.singular,
                inherited: false,
            },
        );
    }

    /// The renames in effect for this scope's own definitions.
    pub fn renames(&self) -> RenameMap {
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.inherited)
            .filter_map(|(name, entry)| {
                let declared = entry.declared_name.as_ref()?;
                Some((name.clone(), declared.clone()))
            })
            .collect()
    }

    /// Expand a relation token.
    ///
    /// Bracketed tokens are unwrapped first. Tokens without a `:`, and
    /// IRIs whose local part starts with `//`, are not CURIEs and pass
    /// through. An undefined prefix leaves the token exactly as written.
    pub fn resolve_relation(&self, token: &str) -> ResolvedRelation {
        let (inner, safe_curie) = match token.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
            Some(inner) => (inner, true),
            None => (token, false),
        };

        let literal = || ResolvedRelation {
            relation: token.to_string(),
            safe_curie,
        };

        let Some((prefix, local)) = inner.split_once(':') else {
            return literal();
        };
        if local.starts_with("//") {
            return literal();
        }

        match self.entries.get(prefix) {
            Some(entry) => ResolvedRelation {
                relation: entry.expansion.expand(local),
                safe_curie,
            },
            None => {
                tracing::debug!(token, "CURIE prefix not defined, keeping token as written");
                literal()
            }
        }
    }

    /// Compact an expanded relation against this scope.
    ///
    /// Only produces tokens that [`resolve_relation`](Self::resolve_relation)
    /// maps back to `expanded`. When several prefixes match, the one leaving
    /// the shortest local part wins (first declared on a tie). Renamed
    /// prefixes are skipped: their published name is ambiguous in the
    /// outgoing document.
    pub fn compact_relation(&self, expanded: &str) -> Option<CurieToken> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.declared_name.is_none())
            .filter_map(|(name, entry)| {
                let local = entry.expansion.contract(expanded)?;
                if local == expanded {
                    return None;
                }
                let token = CurieToken {
                    prefix: name.clone(),
                    local: local.to_string(),
                };
                let round_trip = self.resolve_relation(&token.to_string());
                (round_trip.relation == expanded).then_some(token)
            })
            .min_by_key(|token| token.local.len())
    }

    /// Definition entries for this scope's own prefixes, as link objects,
    /// each paired with whether its source held it as a single value.
    ///
    /// Renamed prefixes are published under their declared name, so
    /// duplicate names in the source come back out duplicated.
    pub fn materialize(&self) -> Vec<(Value, bool)> {
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.inherited)
            .map(|(name, entry)| {
                let published = entry.declared_name.as_deref().unwrap_or(name);
                let mut link = json!({ "name": published, "href": entry.template });
                if find_token(&entry.template).is_some() {
                    link["templated"] = Value::Bool(true);
                }
                (link, entry.singular)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACME: (&str, &str) = ("acme", "http://docs.acme.example/rels/{rel}");

    #[test]
    fn suffix_token_is_prefix_rule() {
        assert_eq!(
            Expansion::parse("http://a.example/rels/{rel}"),
            Expansion::Prefix("http://a.example/rels/".into())
        );
    }

    #[test]
    fn inner_token_is_template_rule() {
        let expansion = Expansion::parse("http://a.example/{rel}.html");
        assert_eq!(expansion.expand("widgets"), "http://a.example/widgets.html");
        assert_eq!(
            expansion.contract("http://a.example/widgets.html"),
            Some("widgets")
        );
        assert_eq!(expansion.contract("http://a.example/.html"), None);
    }

    #[test]
    fn resolve_defined_prefix() {
        let (table, _) = ingest_definitions([ACME]);
        let resolved = table.resolve_relation("acme:widgets");
        assert_eq!(resolved.relation, "http://docs.acme.example/rels/widgets");
        assert!(!resolved.safe_curie);
    }

    #[test]
    fn resolve_bracketed_prefix() {
        let (table, _) = ingest_definitions([ACME]);
        let resolved = table.resolve_relation("[acme:widgets]");
        assert_eq!(resolved.relation, "http://docs.acme.example/rels/widgets");
        assert!(resolved.safe_curie);
    }

    #[test]
    fn undefined_bracketed_prefix_kept_literally() {
        let (table, _) = ingest_definitions([ACME]);
        let resolved = table.resolve_relation("[other:thing]");
        assert_eq!(resolved.relation, "[other:thing]");
        assert!(resolved.safe_curie);
    }

    #[test]
    fn iri_passes_through() {
        let (table, _) = ingest_definitions([("http", "http://evil.example/{rel}")]);
        let resolved = table.resolve_relation("http://example.com/rels/x");
        assert_eq!(resolved.relation, "http://example.com/rels/x");
    }

    #[test]
    fn plain_relation_passes_through() {
        let table = PrefixTable::new();
        assert_eq!(table.resolve_relation("next").relation, "next");
    }

    #[test]
    fn duplicate_names_are_renamed() {
        let (table, renames) =
            ingest_definitions([ACME, ("acme", "http://other.example/{rel}")]);
        assert_eq!(renames.get("acme1").map(String::as_str), Some("acme"));
        // first definition wins for the declared name
        assert_eq!(
            table.resolve_relation("acme:x").relation,
            "http://docs.acme.example/rels/x"
        );
        assert_eq!(
            table.resolve_relation("acme1:x").relation,
            "http://other.example/x"
        );
    }

    #[test]
    fn duplicates_published_verbatim() {
        let (table, _) = ingest_definitions([ACME, ("acme", "http://other.example/{rel}")]);
        let published: Vec<_> = table.materialize().into_iter().map(|(link, _)| link).collect();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0]["name"], "acme");
        assert_eq!(published[1]["name"], "acme");
        assert_eq!(published[1]["href"], "http://other.example/{rel}");
        assert_eq!(published[1]["templated"], true);
    }

    #[test]
    fn compact_inverts_resolve() {
        let (table, _) = ingest_definitions([ACME]);
        let token = table
            .compact_relation("http://docs.acme.example/rels/widgets")
            .unwrap();
        assert_eq!(token.plain(), "acme:widgets");
        assert_eq!(token.to_string(), "[acme:widgets]");
        assert_eq!(
            table.resolve_relation(&token.to_string()).relation,
            "http://docs.acme.example/rels/widgets"
        );
    }

    #[test]
    fn compact_skips_renamed_prefixes() {
        let (table, _) = ingest_definitions([ACME, ("acme", "http://other.example/{rel}")]);
        assert!(table.compact_relation("http://other.example/x").is_none());
    }

    #[test]
    fn compact_refuses_unrelated_relation() {
        let (table, _) = ingest_definitions([ACME]);
        assert!(table.compact_relation("next").is_none());
        assert!(table
            .compact_relation("http://docs.acme.example/rels/")
            .is_none());
    }

    #[test]
    fn compact_prefers_most_specific_prefix() {
        let (table, _) = ingest_definitions([
            ("a", "http://x.example/{rel}"),
            ("b", "http://x.example/y/{rel}"),
        ]);
        let token = table.compact_relation("http://x.example/y/z").unwrap();
        assert_eq!(token.plain(), "b:z");
        let token = table.compact_relation("http://x.example/w").unwrap();
        assert_eq!(token.plain(), "a:w");
    }

    #[test]
    fn materialize_keeps_cardinality() {
        let mut table = PrefixTable::new();
        let mut definition = CurieDefinition::new("acme", "http://acme.example/{rel}");
        definition.singular = true;
        table.insert(&definition);
        let published = table.materialize();
        assert_eq!(published.len(), 1);
        assert!(published[0].1);
    }

    #[test]
    fn bare_token_template_never_compacts() {
        let (table, _) = ingest_definitions([("any", "{rel}")]);
        assert!(table.compact_relation("self").is_none());
    }

    #[test]
    fn inherited_prefix_is_shadowed_not_renamed() {
        let (parent, _) = ingest_definitions([ACME]);
        let mut child = parent.inherit();
        let added = child.ingest([("acme", "http://child.example/{rel}")]);
        assert!(child.renames().is_empty());
        assert_eq!(added[0].name, "acme");
        assert_eq!(
            child.resolve_relation("acme:x").relation,
            "http://child.example/x"
        );
    }

    #[test]
    fn inherited_prefixes_not_materialized() {
        let (parent, _) = ingest_definitions([ACME]);
        let child = parent.inherit();
        assert!(!child.has_own_definitions());
        assert!(child.materialize().is_empty());
        assert_eq!(
            child.resolve_relation("acme:x").relation,
            "http://docs.acme.example/rels/x"
        );
    }
}
