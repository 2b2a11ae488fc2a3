//! Embedded resources <=> canonical child documents.

use serde_json::{Map, Value};

use crate::curie::{PrefixTable, ResolvedRelation};
use crate::error::ConvertError;
use crate::hal::{self, Depth, Encoded};
use crate::types::EmbeddedResource;

/// Decode one embedded value into a child document.
///
/// The child resolves CURIEs against `scope` plus any prefixes it declares
/// itself. Values that are not objects cannot be documents and are skipped.
pub fn decode_embedded(
    value: &Value,
    relation: &ResolvedRelation,
    singular: bool,
    scope: &PrefixTable,
    depth: Depth,
) -> Result<Option<EmbeddedResource>, ConvertError> {
    let Value::Object(map) = value else {
        tracing::debug!(
            rel = %relation.relation,
            value = %value,
            "skipping embedded value that is not an object"
        );
        return Ok(None);
    };

    let document = hal::decode_document(map, scope, depth.descend()?)?;

    Ok(Some(EmbeddedResource {
        document,
        rel: vec![relation.relation.clone()],
        singular,
        safe_curie: relation.safe_curie,
        link: None,
    }))
}

/// Encode a child document back into an embedded object.
pub fn encode_embedded(resource: &EmbeddedResource, scope: &PrefixTable) -> Encoded {
    hal::encode_document(&resource.document, scope)
}

/// Place `value` under `relation`, preserving the source's cardinality.
///
/// - an existing collection is appended to
/// - an existing single value is promoted to a two-element collection
/// - an empty slot takes a single value when `singular`, otherwise a
///   one-element collection
///
/// Used for both the link and the embedded collections.
pub fn attach(slots: &mut Map<String, Value>, relation: String, value: Value, singular: bool) {
    match slots.get_mut(&relation) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let prior = existing.take();
            *existing = Value::Array(vec![prior, value]);
        }
        None if singular => {
            slots.insert(relation, value);
        }
        None => {
            slots.insert(relation, Value::Array(vec![value]));
        }
    }
}
