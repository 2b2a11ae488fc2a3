//! UHF (`application/vnd.uhf+json`): the canonical document's own JSON form.
//!
//! ```json
//! {
//!   "head": {
//!     "self": { "action": "/orders", "rel": ["self"], "singular": true },
//!     "order[0]": { "rel": ["order"], "singular": false, "head": {}, "body": { "id": 1 } }
//!   },
//!   "body": { "count": 1 }
//! }
//! ```
//!
//! Nodes are classified on input, once: a node with `head` or `body` is an
//! embedded resource, a node with any non-structural attribute is a link,
//! and a node can be both. A non-embedded link whose `rel` includes
//! `curies` and that names its prefix in `extensions.name` is a CURIE
//! definition.

use serde_json::{Map, Value};

use crate::adapter::{Adapter, AdapterDescriptor, BaseSerialization};
use crate::affordance::{is_link_like, STRUCTURAL_ATTRIBUTES};
use crate::error::ConvertError;
use crate::keys::{derive_relations, singular_from_key, IndexedKey};
use crate::types::{
    json_type_name, Affordance, CurieDefinition, Document, EmbeddedResource, Head, Node,
    CURIE_RELATION,
};
use crate::validator::validate_uhf;

/// MIME type handled by [`UhfAdapter`].
pub const UHF_MIME_TYPE: &str = "application/vnd.uhf+json";

/// Extension carrying a CURIE definition's prefix name.
const CURIE_NAME: &str = "name";

/// Extension carrying a renamed CURIE prefix's declared name.
const CURIE_DECLARED_NAME: &str = "declaredName";

/// UHF adapter. Input is validated against the UHF schema first.
#[derive(Debug, Clone, Copy, Default)]
pub struct UhfAdapter;

impl Adapter for UhfAdapter {
    fn descriptor(&self) -> AdapterDescriptor {
        AdapterDescriptor {
            name: "uhf",
            base: BaseSerialization::Json,
            mime_type: UHF_MIME_TYPE,
        }
    }

    fn decode(&self, value: &Value) -> Result<Document, ConvertError> {
        validate_uhf(value)?;
        document_from_value(value)
    }

    fn encode(&self, doc: &Document) -> Value {
        document_to_value(doc)
    }
}

/// Build a canonical document from its UHF form.
///
/// Missing `rel` lists and `singular` flags are derived from the node's key.
pub fn document_from_value(value: &Value) -> Result<Document, ConvertError> {
    let Value::Object(map) = value else {
        return Err(ConvertError::NotAnObject {
            actual: json_type_name(value).to_string(),
        });
    };
    Ok(document_from_parts(map.get("head"), map.get("body")))
}

fn document_from_parts(head: Option<&Value>, body: Option<&Value>) -> Document {
    let mut doc = Document::new();

    if let Some(Value::Object(body)) = body {
        doc.body = body.clone();
    }
    if let Some(Value::Object(head)) = head {
        for (key, node) in head {
            match node {
                Value::Object(node) => {
                    doc.head.insert(key.clone(), node_from_map(key, node));
                }
                other => {
                    tracing::debug!(key = %key, value = %other, "skipping non-object head entry")
                }
            }
        }
    }

    doc
}

fn node_from_map(key: &str, node: &Map<String, Value>) -> Node {
    let explicit = string_list(node.get("rel"));
    let rel = derive_relations(&explicit, key);
    let singular = node
        .get("singular")
        .and_then(Value::as_bool)
        .unwrap_or_else(|| singular_from_key(key));
    // A relation taken from a bracketed key keeps its bracketed form.
    let safe_curie = node
        .get("safeCurie")
        .and_then(Value::as_bool)
        .unwrap_or_else(|| explicit.is_empty() && IndexedKey::parse(key).is_safe_curie());

    let is_embedded = node.contains_key("head") || node.contains_key("body");
    let is_link = is_link_like(node);

    if is_embedded {
        let link = is_link.then(|| affordance_from_map(node, rel.clone(), singular, safe_curie));
        return Node::Embedded(EmbeddedResource {
            document: document_from_parts(node.get("head"), node.get("body")),
            rel,
            singular,
            safe_curie,
            link,
        });
    }

    let affordance = affordance_from_map(node, rel, singular, safe_curie);
    match curie_from_affordance(&affordance) {
        Some(definition) => Node::Curie(definition),
        None => Node::Affordance(affordance),
    }
}

fn affordance_from_map(
    node: &Map<String, Value>,
    rel: Vec<String>,
    singular: bool,
    safe_curie: bool,
) -> Affordance {
    let text = |name: &str| node.get(name).and_then(Value::as_str).map(str::to_string);

    let mut extensions = match node.get("extensions") {
        Some(Value::Object(extensions)) => extensions.clone(),
        _ => Map::new(),
    };
    // Attributes UHF has no field for travel as extensions.
    for (name, value) in node {
        let known = matches!(
            name.as_str(),
            "action" | "title" | "contentType" | "templated"
        );
        if !known && !STRUCTURAL_ATTRIBUTES.contains(&name.as_str()) {
            extensions.insert(name.clone(), value.clone());
        }
    }

    Affordance {
        action: text("action"),
        rel,
        title: text("title"),
        content_type: text("contentType"),
        templated: node.get("templated").and_then(Value::as_bool),
        singular,
        safe_curie,
        extensions,
    }
}

fn curie_from_affordance(affordance: &Affordance) -> Option<CurieDefinition> {
    if !affordance.has_relation(CURIE_RELATION) {
        return None;
    }
    let template = affordance.action.as_ref()?;
    let name = affordance.extensions.get(CURIE_NAME)?.as_str()?;
    let declared_name = affordance
        .extensions
        .get(CURIE_DECLARED_NAME)
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(CurieDefinition {
        name: name.to_string(),
        declared_name,
        template: template.clone(),
        singular: affordance.singular,
    })
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(single)) => vec![single.clone()],
        _ => Vec::new(),
    }
}

/// UHF form of a canonical document.
pub fn document_to_value(doc: &Document) -> Value {
    let mut map = Map::new();
    map.insert("head".into(), Value::Object(head_to_map(&doc.head)));
    map.insert("body".into(), Value::Object(doc.body.clone()));
    Value::Object(map)
}

fn head_to_map(head: &Head) -> Map<String, Value> {
    head.iter()
        .map(|(key, node)| (key.clone(), Value::Object(node_to_map(node))))
        .collect()
}

fn node_to_map(node: &Node) -> Map<String, Value> {
    match node {
        Node::Affordance(affordance) => affordance_to_map(affordance),
        Node::Embedded(resource) => {
            let mut map = match &resource.link {
                Some(link) => affordance_to_map(link),
                None => Map::new(),
            };
            map.insert("rel".into(), strings(&resource.rel));
            map.insert("singular".into(), Value::Bool(resource.singular));
            if resource.safe_curie {
                map.insert("safeCurie".into(), Value::Bool(true));
            } else {
                map.remove("safeCurie");
            }
            map.insert(
                "head".into(),
                Value::Object(head_to_map(&resource.document.head)),
            );
            map.insert("body".into(), Value::Object(resource.document.body.clone()));
            map
        }
        Node::Curie(definition) => {
            let mut extensions = Map::new();
            extensions.insert(CURIE_NAME.into(), Value::String(definition.name.clone()));
            if let Some(declared) = &definition.declared_name {
                extensions.insert(CURIE_DECLARED_NAME.into(), Value::String(declared.clone()));
            }
            affordance_to_map(&Affordance {
                action: Some(definition.template.clone()),
                rel: vec![CURIE_RELATION.to_string()],
                templated: Some(true),
                singular: definition.singular,
                extensions,
                ..Affordance::default()
            })
        }
    }
}

fn affordance_to_map(affordance: &Affordance) -> Map<String, Value> {
    let mut map = Map::new();
    if let Some(action) = &affordance.action {
        map.insert("action".into(), Value::String(action.clone()));
    }
    map.insert("rel".into(), strings(&affordance.rel));
    if let Some(title) = &affordance.title {
        map.insert("title".into(), Value::String(title.clone()));
    }
    if let Some(content_type) = &affordance.content_type {
        map.insert("contentType".into(), Value::String(content_type.clone()));
    }
    if let Some(templated) = affordance.templated {
        map.insert("templated".into(), Value::Bool(templated));
    }
    map.insert("singular".into(), Value::Bool(affordance.singular));
    if affordance.safe_curie {
        map.insert("safeCurie".into(), Value::Bool(true));
    }
    if !affordance.extensions.is_empty() {
        map.insert(
            "extensions".into(),
            Value::Object(affordance.extensions.clone()),
        );
    }
    map
}

fn strings(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}
