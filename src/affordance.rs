//! Link objects <=> canonical affordances.

use serde_json::{Map, Value};

use crate::curie::ResolvedRelation;
use crate::types::{Affordance, Head, SELF_RELATION};

/// HAL link attributes carried in the extension bag.
pub const EXTENSION_ATTRIBUTES: &[&str] = &["deprecation", "name", "profile", "hreflang"];

/// UHF node attributes that describe structure rather than a link.
pub const STRUCTURAL_ATTRIBUTES: &[&str] =
    &["head", "body", "rel", "extensions", "singular", "safeCurie"];

/// Whether a UHF node object carries link attributes.
///
/// Any attribute outside the structural set counts, so a node can be both
/// an embedded resource and a link at the same time.
pub fn is_link_like(node: &Map<String, Value>) -> bool {
    node.keys()
        .any(|key| !STRUCTURAL_ATTRIBUTES.contains(&key.as_str()))
}

/// Decode one HAL link object into an affordance.
///
/// A bare string is accepted as a link whose `href` is that string.
/// Attributes that are not HAL link attributes, or that have the wrong
/// type, are kept in `extensions` so they survive re-encoding.
pub fn decode_link(link: &Value, relation: &ResolvedRelation, singular: bool) -> Option<Affordance> {
    let mut affordance = Affordance {
        rel: vec![relation.relation.clone()],
        singular,
        safe_curie: relation.safe_curie,
        ..Affordance::default()
    };

    let attributes = match link {
        Value::Object(attributes) => attributes,
        Value::String(href) => {
            affordance.action = Some(href.clone());
            return Some(affordance);
        }
        other => {
            tracing::debug!(
                rel = %relation.relation,
                value = %other,
                "skipping link that is neither an object nor a string"
            );
            return None;
        }
    };

    for (name, value) in attributes {
        match (name.as_str(), value) {
            ("href", Value::String(href)) => affordance.action = Some(href.clone()),
            ("title", Value::String(title)) => affordance.title = Some(title.clone()),
            ("type", Value::String(content_type)) => {
                affordance.content_type = Some(content_type.clone())
            }
            ("templated", Value::Bool(templated)) => affordance.templated = Some(*templated),
            (name, value) => {
                if !EXTENSION_ATTRIBUTES.contains(&name) {
                    tracing::trace!(attribute = name, "carrying non-HAL link attribute");
                }
                affordance.extensions.insert(name.to_string(), value.clone());
            }
        }
    }

    Some(affordance)
}

/// Encode an affordance as a HAL link object.
///
/// An affordance without an action points at the document itself
/// (`self_href`), or at the empty string when the document has no self link.
pub fn encode_affordance(affordance: &Affordance, self_href: Option<&str>) -> Value {
    let mut link = Map::new();

    let href = match (&affordance.action, self_href) {
        (Some(action), _) => action.as_str(),
        (None, Some(self_href)) => self_href,
        (None, None) => {
            tracing::debug!(rel = ?affordance.rel, "link has no target and document has no self link");
            ""
        }
    };
    link.insert("href".into(), Value::String(href.to_string()));

    if let Some(templated) = affordance.templated {
        link.insert("templated".into(), Value::Bool(templated));
    }
    if let Some(content_type) = &affordance.content_type {
        link.insert("type".into(), Value::String(content_type.clone()));
    }
    if let Some(title) = &affordance.title {
        link.insert("title".into(), Value::String(title.clone()));
    }
    for (name, value) in &affordance.extensions {
        link.insert(name.clone(), value.clone());
    }

    Value::Object(link)
}

/// The document's own address: the action of the first link whose
/// relations include `self`.
pub fn find_self_href(head: &Head) -> Option<&str> {
    head.values()
        .filter_map(|node| node.as_affordance())
        .filter(|affordance| affordance.has_relation(SELF_RELATION))
        .filter_map(|affordance| affordance.action.as_deref())
        .find(|action| !action.is_empty())
}
