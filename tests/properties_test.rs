//! Property-based tests for key allocation, CURIE resolution and round trips.

use std::collections::HashSet;

use conversant::{
    hal, ingest_definitions, Adapter, HalOptions, IndexedKey, UhfAdapter, HEAD_KEYS,
};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

// Relation names without CURIE syntax
fn relation() -> impl Strategy<Value = String> {
    "[a-z]{1,8}".prop_filter("reserved relation", |name| name != "curies")
}

// Strategy for generating opaque body values
fn body_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        "[a-z ]{0,10}".prop_map(Value::from),
    ]
}

fn body() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("[a-z]{1,6}", body_value(), 0..4)
        .prop_map(|fields| fields.into_iter().collect())
}

fn link() -> impl Strategy<Value = Value> {
    "/[a-z0-9]{0,8}".prop_map(|href| json!({ "href": href }))
}

// A single value or a non-empty collection of values
fn one_or_many<S: Strategy<Value = Value>>(member: S) -> impl Strategy<Value = Value> {
    (prop::collection::vec(member, 1..4), any::<bool>()).prop_map(|(mut items, single)| {
        if single {
            items.swap_remove(0)
        } else {
            Value::Array(items)
        }
    })
}

fn links() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map(relation(), one_or_many(link()), 0..4)
        .prop_map(|links| links.into_iter().collect())
}

fn with_reserved(
    mut doc: Map<String, Value>,
    links: Map<String, Value>,
    embedded: Map<String, Value>,
) -> Value {
    if !links.is_empty() {
        doc.insert("_links".into(), Value::Object(links));
    }
    if !embedded.is_empty() {
        doc.insert("_embedded".into(), Value::Object(embedded));
    }
    Value::Object(doc)
}

fn embedded_resource() -> impl Strategy<Value = Value> {
    (body(), links()).prop_map(|(body, links)| with_reserved(body, links, Map::new()))
}

// Strategy for generating HAL documents one embedding level deep
fn hal_document() -> impl Strategy<Value = Value> {
    let embedded = prop::collection::btree_map(relation(), one_or_many(embedded_resource()), 0..3)
        .prop_map(|embedded| embedded.into_iter().collect::<Map<_, _>>());

    (body(), links(), embedded)
        .prop_map(|(body, links, embedded)| with_reserved(body, links, embedded))
}

proptest! {
    #[test]
    fn allocated_keys_are_unique(
        requests in prop::collection::vec(("[ab]{1,2}", any::<bool>()), 0..20)
    ) {
        let mut used = HashSet::new();
        for (index, (base, singular)) in requests.iter().enumerate() {
            let key = if *singular {
                HEAD_KEYS.allocate(base, |k| used.contains(k))
            } else {
                HEAD_KEYS.allocate_indexed(base, index, |k| used.contains(k))
            };
            prop_assert!(used.insert(key));
        }
        prop_assert_eq!(used.len(), requests.len());
    }

    #[test]
    fn allocation_is_deterministic(
        bases in prop::collection::vec("[ab]{1,2}", 0..20)
    ) {
        let run = || {
            let mut used: Vec<String> = Vec::new();
            for base in &bases {
                let key = HEAD_KEYS.allocate(base, |k| used.iter().any(|u| u == k));
                used.push(key);
            }
            used
        };
        prop_assert_eq!(run(), run());
    }

    #[test]
    fn indexed_keys_parse_back(base in "[a-z]{1,6}(:[a-z]{1,6})?", index in 0usize..1000) {
        let key = HEAD_KEYS.format(&base, index);
        let parsed = IndexedKey::parse(&key);
        prop_assert_eq!(parsed.relation, base.as_str());
        prop_assert_eq!(parsed.index, Some(index));
    }

    #[test]
    fn compact_inverts_resolve(local in "[a-z][a-z0-9-]{0,10}", safe in any::<bool>()) {
        let (table, _) = ingest_definitions([
            ("acme", "http://docs.acme.example/rels/{rel}"),
            ("doc", "http://example.com/docs/{rel}.html"),
        ]);

        for prefix in ["acme", "doc"] {
            let token = if safe {
                format!("[{}:{}]", prefix, local)
            } else {
                format!("{}:{}", prefix, local)
            };
            let resolved = table.resolve_relation(&token);
            prop_assert_eq!(resolved.safe_curie, safe);

            let compact = table.compact_relation(&resolved.relation).unwrap();
            prop_assert_eq!(compact.prefix.as_str(), prefix);
            prop_assert_eq!(compact.render(safe), token);
        }
    }

    #[test]
    fn hal_round_trip_is_structurally_equal(source in hal_document()) {
        let doc = hal::decode(&source, &HalOptions::default()).unwrap();
        prop_assert_eq!(hal::encode(&doc), source);
    }

    #[test]
    fn uhf_round_trip_preserves_document(source in hal_document()) {
        let doc = hal::decode(&source, &HalOptions::default()).unwrap();
        let uhf = UhfAdapter.encode(&doc);
        let restored = UhfAdapter.decode(&uhf).unwrap();
        prop_assert_eq!(&restored, &doc);
        prop_assert_eq!(hal::encode(&restored), source);
    }
}
