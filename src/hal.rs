//! HAL (`application/hal+json`) <=> canonical documents.
//!
//! A HAL document is a JSON object with two reserved members:
//!
//! - `_links`: relation name => link object, or array of link objects
//! - `_embedded`: relation name => resource object, or array of resources
//!
//! Everything else is application data and is copied to `body` verbatim.
//! Members of `_links` or `_embedded` that are neither links nor documents
//! (`"count": 5`) also land in `body`, under the same reserved name, and are
//! merged back in on encode.
//!
//! # Keys
//!
//! A relation holding a single value is stored under the relation name
//! (`self`); members of an array are stored under indexed keys (`item[0]`,
//! `item[1]`). Keys only aid readability: each node carries its `rel` list
//! and a `singular` flag, and encoding uses those to rebuild the same
//! object-or-array shape.
//!
//! # CURIEs
//!
//! `_links.curies` is read before any other relation so that compact
//! relations (`acme:widgets`, `[acme:widgets]`) are stored expanded. The
//! definitions are kept in `head` as [`Node::Curie`] entries and written back
//! only when at least one relation was compacted on the way out.

use serde_json::{Map, Value};

use crate::adapter::{Adapter, AdapterDescriptor, BaseSerialization};
use crate::affordance::{decode_link, encode_affordance, find_self_href};
use crate::curie::PrefixTable;
use crate::error::ConvertError;
use crate::keys::{derive_relations, HEAD_KEYS};
use crate::resource::{attach, decode_embedded, encode_embedded};
use crate::types::{
    json_type_name, Affordance, Document, HalOptions, Head, Node, CURIE_RELATION,
};

/// Reserved member holding links.
pub const LINKS: &str = "_links";

/// Reserved member holding embedded resources.
pub const EMBEDDED: &str = "_embedded";

/// MIME type handled by [`HalAdapter`].
pub const HAL_MIME_TYPE: &str = "application/hal+json";

/// Nesting position during decode, checked against the caller's limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Depth {
    current: usize,
    limit: Option<usize>,
}

impl Depth {
    pub fn root(limit: Option<usize>) -> Self {
        Self { current: 0, limit }
    }

    /// One level deeper, or `DepthExceeded` past the limit.
    pub fn descend(self) -> Result<Self, ConvertError> {
        let current = self.current + 1;
        match self.limit {
            Some(limit) if current > limit => Err(ConvertError::DepthExceeded { limit }),
            _ => Ok(Self { current, ..self }),
        }
    }
}

/// An encoded document plus whether any relation in it (or below it) was
/// written in compact form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Encoded {
    pub value: Map<String, Value>,
    pub compacted: bool,
}

/// HAL adapter.
#[derive(Debug, Clone, Default)]
pub struct HalAdapter {
    options: HalOptions,
}

impl HalAdapter {
    pub fn new(options: HalOptions) -> Self {
        Self { options }
    }
}

impl Adapter for HalAdapter {
    fn descriptor(&self) -> AdapterDescriptor {
        AdapterDescriptor {
            name: "hal",
            base: BaseSerialization::Json,
            mime_type: HAL_MIME_TYPE,
        }
    }

    fn decode(&self, value: &Value) -> Result<Document, ConvertError> {
        decode(value, &self.options)
    }

    fn encode(&self, doc: &Document) -> Value {
        encode(doc)
    }
}

/// Decode a parsed HAL document.
///
/// # Errors
///
/// Returns `ConvertError::NotAnObject` if the root is not an object, and
/// `ConvertError::DepthExceeded` if embedding nests deeper than
/// `options.max_depth`.
pub fn decode(value: &Value, options: &HalOptions) -> Result<Document, ConvertError> {
    let Value::Object(map) = value else {
        return Err(ConvertError::NotAnObject {
            actual: json_type_name(value).to_string(),
        });
    };
    decode_document(map, &PrefixTable::new(), Depth::root(options.max_depth))
}

/// Encode a canonical document as HAL. Never fails.
pub fn encode(doc: &Document) -> Value {
    Value::Object(encode_document(doc, &PrefixTable::new()).value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Link,
    Embedded,
}

pub(crate) fn decode_document(
    map: &Map<String, Value>,
    parent_scope: &PrefixTable,
    depth: Depth,
) -> Result<Document, ConvertError> {
    let mut doc = Document::new();
    let mut links = None;
    let mut embedded = None;

    for (name, value) in map {
        match (name.as_str(), value) {
            (LINKS, Value::Object(members)) => links = Some(members),
            (EMBEDDED, Value::Object(members)) => embedded = Some(members),
            _ => {
                doc.body.insert(name.clone(), value.clone());
            }
        }
    }

    let mut scope = parent_scope.inherit();
    let mut kept_links = Map::new();
    let mut kept_embedded = Map::new();

    // Links first: curies must be in scope before any relation is read.
    if let Some(links) = links {
        if let Some(curies) = links.get(CURIE_RELATION) {
            decode_curies(curies, &mut scope, &mut doc.head);
        }
        for (token, value) in links {
            if token == CURIE_RELATION {
                continue;
            }
            if let Some(kept) =
                decode_node(&mut doc.head, token, value, Kind::Link, &scope, depth)?
            {
                kept_links.insert(token.clone(), kept);
            }
        }
    }

    if let Some(embedded) = embedded {
        for (token, value) in embedded {
            if let Some(kept) =
                decode_node(&mut doc.head, token, value, Kind::Embedded, &scope, depth)?
            {
                kept_embedded.insert(token.clone(), kept);
            }
        }
    }

    // Members that are neither links nor documents stay in the body under
    // their reserved name.
    if !kept_links.is_empty() {
        doc.body.insert(LINKS.into(), Value::Object(kept_links));
    }
    if !kept_embedded.is_empty() {
        doc.body.insert(EMBEDDED.into(), Value::Object(kept_embedded));
    }

    Ok(doc)
}

/// Ingest `_links.curies`. Entries without a string `name` and `href` are
/// not definitions and are kept as ordinary links.
fn decode_curies(curies: &Value, scope: &mut PrefixTable, head: &mut Head) {
    let (entries, singular) = match curies {
        Value::Array(entries) => (entries.iter().collect::<Vec<_>>(), false),
        single => (vec![single], true),
    };

    let (definitions, ordinary): (Vec<_>, Vec<_>) = entries.into_iter().partition(|entry| {
        entry.get("name").and_then(Value::as_str).is_some()
            && entry.get("href").and_then(Value::as_str).is_some()
    });

    let pairs = definitions.iter().filter_map(|entry| {
        Some((entry.get("name")?.as_str()?, entry.get("href")?.as_str()?))
    });
    let added = scope.ingest(pairs);

    for (index, mut definition) in added.into_iter().enumerate() {
        definition.singular = singular;
        let key = allocate(head, CURIE_RELATION, singular, index);
        head.insert(key, Node::Curie(definition));
    }

    let relation = scope.resolve_relation(CURIE_RELATION);
    for (index, entry) in ordinary.into_iter().enumerate() {
        tracing::debug!(entry = %entry, "curies entry is not a definition, keeping as link");
        if let Some(affordance) = decode_link(entry, &relation, singular) {
            let key = allocate(head, CURIE_RELATION, singular, index);
            head.insert(key, Node::Affordance(affordance));
        }
    }
}

/// Decode every value under one relation into `head`.
///
/// Returns the members that could not be decoded, in the relation's
/// original shape.
fn decode_node(
    head: &mut Head,
    token: &str,
    value: &Value,
    kind: Kind,
    scope: &PrefixTable,
    depth: Depth,
) -> Result<Option<Value>, ConvertError> {
    let relation = scope.resolve_relation(token);

    let (members, singular) = match value {
        Value::Array(members) => (members.iter().collect::<Vec<_>>(), false),
        single => (vec![single], true),
    };

    let mut skipped = Vec::new();
    for (index, member) in members.into_iter().enumerate() {
        let node = match kind {
            Kind::Link => decode_link(member, &relation, singular).map(Node::Affordance),
            Kind::Embedded => {
                decode_embedded(member, &relation, singular, scope, depth)?.map(Node::Embedded)
            }
        };
        match node {
            Some(node) => {
                let key = allocate(head, token, singular, index);
                head.insert(key, node);
            }
            None => skipped.push(member.clone()),
        }
    }

    Ok(match (skipped.is_empty(), singular) {
        (true, _) => None,
        (false, true) => skipped.pop(),
        (false, false) => Some(Value::Array(skipped)),
    })
}

fn allocate(head: &Head, base: &str, singular: bool, index: usize) -> String {
    let is_taken = |key: &str| head.contains_key(key);
    if singular {
        HEAD_KEYS.allocate(base, is_taken)
    } else {
        HEAD_KEYS.allocate_indexed(base, index, is_taken)
    }
}

pub(crate) fn encode_document(doc: &Document, parent_scope: &PrefixTable) -> Encoded {
    let mut scope = parent_scope.inherit();
    for definition in doc.curie_definitions() {
        scope.insert(definition);
    }

    let self_href = find_self_href(&doc.head);
    let mut links = Map::new();
    let mut embedded = Map::new();
    let mut compacted = false;

    for (key, node) in &doc.head {
        match node {
            Node::Curie(_) => {}
            Node::Affordance(affordance) => {
                compacted |= encode_link(&mut links, key, affordance, self_href, &scope);
            }
            Node::Embedded(resource) => {
                let child = encode_embedded(resource, &scope);
                compacted |= child.compacted;
                let child = Value::Object(child.value);

                for rel in derive_relations(&resource.rel, key) {
                    let (name, compact) = relation_token(&rel, resource.safe_curie, &scope);
                    compacted |= compact;
                    attach(&mut embedded, name, child.clone(), resource.singular);
                }

                if let Some(link) = &resource.link {
                    let link = Affordance {
                        rel: if link.rel.is_empty() {
                            resource.rel.clone()
                        } else {
                            link.rel.clone()
                        },
                        ..link.clone()
                    };
                    compacted |= encode_link(&mut links, key, &link, self_href, &scope);
                }
            }
        }
    }

    if compacted && scope.has_own_definitions() {
        links = with_curies(links, scope.materialize());
    }

    let mut value = doc.body.clone();
    merge_reserved(&mut value, LINKS, links);
    merge_reserved(&mut value, EMBEDDED, embedded);

    Encoded { value, compacted }
}

/// Write a generated collection under its reserved name, keeping any
/// undecodable members the body carried there.
fn merge_reserved(value: &mut Map<String, Value>, name: &str, generated: Map<String, Value>) {
    if generated.is_empty() {
        return;
    }
    let kept = match value.get_mut(name) {
        Some(Value::Object(kept)) => std::mem::take(kept),
        _ => Map::new(),
    };

    let mut merged = generated;
    for (relation, extra) in kept {
        match merged.get_mut(&relation) {
            Some(existing) => {
                let mut items = match existing.take() {
                    Value::Array(items) => items,
                    single => vec![single],
                };
                match extra {
                    Value::Array(extra) => items.extend(extra),
                    single => items.push(single),
                }
                *existing = Value::Array(items);
            }
            None => {
                merged.insert(relation, extra);
            }
        }
    }
    value.insert(name.into(), Value::Object(merged));
}

/// Attach one affordance under each of its relations. Returns whether any
/// relation was compacted.
fn encode_link(
    links: &mut Map<String, Value>,
    key: &str,
    affordance: &Affordance,
    self_href: Option<&str>,
    scope: &PrefixTable,
) -> bool {
    let link = encode_affordance(affordance, self_href);
    let mut compacted = false;

    for rel in derive_relations(&affordance.rel, key) {
        let (name, compact) = relation_token(&rel, affordance.safe_curie, scope);
        compacted |= compact;
        attach(links, name, link.clone(), affordance.singular);
    }

    compacted
}

/// Relation name as written in the outgoing document.
fn relation_token(rel: &str, safe_curie: bool, scope: &PrefixTable) -> (String, bool) {
    match scope.compact_relation(rel) {
        Some(token) => (token.render(safe_curie), true),
        None => (rel.to_string(), false),
    }
}

/// Put regenerated definitions first in `_links`, ahead of any `curies`
/// entries that were not definitions. A lone definition that was a single
/// value in its source stays a single value.
fn with_curies(links: Map<String, Value>, definitions: Vec<(Value, bool)>) -> Map<String, Value> {
    let mut curies = Map::new();
    for (definition, singular) in definitions {
        attach(&mut curies, CURIE_RELATION.into(), definition, singular);
    }

    let mut rest = Map::new();
    for (name, value) in links {
        if name != CURIE_RELATION {
            rest.insert(name, value);
            continue;
        }
        match value {
            Value::Array(items) => {
                for item in items {
                    attach(&mut curies, name.clone(), item, false);
                }
            }
            single => attach(&mut curies, name, single, true),
        }
    }

    curies.extend(rest);
    curies
}
