//! Core types for the canonical (UHF) document tree.

use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Relation name marking the document's own address.
pub const SELF_RELATION: &str = "self";

/// Relation name reserved for CURIE definitions.
pub const CURIE_RELATION: &str = "curies";

/// Ordered mapping of head keys to nodes.
pub type Head = IndexMap<String, Node>;

/// Ordered mapping of opaque application fields.
pub type Body = Map<String, Value>;

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Options for decoding HAL documents.
#[derive(Debug, Clone, Default)]
pub struct HalOptions {
    /// Deepest `_embedded` nesting accepted. Unlimited when `None`.
    pub max_depth: Option<usize>,
}

impl HalOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject documents that embed deeper than `limit` levels.
    pub fn max_depth(mut self, limit: usize) -> Self {
        self.max_depth = Some(limit);
        self
    }
}

/// Format-neutral document: metadata nodes in `head`, application data in `body`.
///
/// Both mappings iterate in insertion order, which is the order the source
/// document presented them in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub head: Head,
    pub body: Body,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Affordances and embedded link facets, in head order.
    pub fn affordances(&self) -> impl Iterator<Item = (&str, &Affordance)> {
        self.head.iter().filter_map(|(key, node)| {
            node.as_affordance().map(|affordance| (key.as_str(), affordance))
        })
    }

    /// Embedded resources, in head order.
    pub fn embedded(&self) -> impl Iterator<Item = (&str, &EmbeddedResource)> {
        self.head.iter().filter_map(|(key, node)| match node {
            Node::Embedded(resource) => Some((key.as_str(), resource)),
            _ => None,
        })
    }

    /// CURIE definitions declared by this document (not inherited ones).
    pub fn curie_definitions(&self) -> impl Iterator<Item = &CurieDefinition> {
        self.head.values().filter_map(|node| match node {
            Node::Curie(definition) => Some(definition),
            _ => None,
        })
    }
}

/// A single `head` entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// An actionable link.
    Affordance(Affordance),
    /// A nested document.
    Embedded(EmbeddedResource),
    /// A compact URI prefix definition.
    Curie(CurieDefinition),
}

impl Node {
    /// The link view of this node, if it has one.
    ///
    /// Embedded resources only have a link view when they were also
    /// link-classified.
    pub fn as_affordance(&self) -> Option<&Affordance> {
        match self {
            Node::Affordance(affordance) => Some(affordance),
            Node::Embedded(resource) => resource.link.as_ref(),
            Node::Curie(_) => None,
        }
    }

    /// True if the node is emitted into a link collection.
    pub fn is_link(&self) -> bool {
        self.as_affordance().is_some()
    }

    /// True if the node is emitted into an embedded collection.
    pub fn is_embedded(&self) -> bool {
        matches!(self, Node::Embedded(_))
    }
}

/// Canonical link node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Affordance {
    /// Target URI. `None` means "this document".
    pub action: Option<String>,
    pub rel: Vec<String>,
    pub title: Option<String>,
    pub content_type: Option<String>,
    pub templated: Option<bool>,
    /// The source held one value (not a collection) for this relation.
    pub singular: bool,
    /// The relation was written as a bracketed CURIE (`[prefix:local]`).
    pub safe_curie: bool,
    pub extensions: Map<String, Value>,
}

impl Affordance {
    pub fn new(action: impl Into<String>, rel: impl Into<String>) -> Self {
        Self {
            action: Some(action.into()),
            rel: vec![rel.into()],
            singular: true,
            ..Self::default()
        }
    }

    pub fn has_relation(&self, rel: &str) -> bool {
        self.rel.iter().any(|r| r == rel)
    }
}

/// Nested document plus the context it was embedded under.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddedResource {
    pub document: Document,
    pub rel: Vec<String>,
    pub singular: bool,
    pub safe_curie: bool,
    /// Link attributes carried alongside the nested document. When present
    /// the node is emitted as both a link and an embedded resource.
    pub link: Option<Affordance>,
}

impl EmbeddedResource {
    pub fn new(document: Document, rel: impl Into<String>) -> Self {
        Self {
            document,
            rel: vec![rel.into()],
            singular: true,
            ..Self::default()
        }
    }
}

/// Compact URI prefix definition, e.g. `acme` => `http://acme.example/rels/{rel}`.
#[derive(Debug, Clone, PartialEq)]
pub struct CurieDefinition {
    /// Prefix name, unique within the document.
    pub name: String,
    /// Name as written in the source when it had to be renamed to stay unique.
    pub declared_name: Option<String>,
    /// URI template with at most one substitution token.
    pub template: String,
    pub singular: bool,
}

impl CurieDefinition {
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_name: None,
            template: template.into(),
            singular: false,
        }
    }

    /// The name to publish in an outgoing document.
    pub fn published_name(&self) -> &str {
        self.declared_name.as_deref().unwrap_or(&self.name)
    }
}
