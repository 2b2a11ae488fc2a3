//! Conversant
//!
//! Converts hypermedia documents between formats through one canonical tree
//! (UHF), so no format pair needs its own converter.
//!
//! A canonical [`Document`] has a `head` of metadata nodes (links, embedded
//! resources, CURIE definitions) and a `body` of application data copied
//! verbatim.
//!
//! # Example
//!
//! ```
//! use conversant::{hal, HalOptions, Node};
//! use serde_json::json;
//!
//! let source = json!({
//!     "_links": { "self": { "href": "/orders/7" } },
//!     "_embedded": { "item": [{ "sku": "a" }, { "sku": "b" }] },
//!     "total": 12
//! });
//!
//! let doc = hal::decode(&source, &HalOptions::default()).unwrap();
//! assert_eq!(doc.body["total"], json!(12));
//! assert!(matches!(doc.head["self"], Node::Affordance(_)));
//! assert!(matches!(doc.head["item[1]"], Node::Embedded(_)));
//!
//! // Shape is preserved: `item` goes back out as an array.
//! assert_eq!(hal::encode(&doc), source);
//! ```
//!
//! # Round trips
//!
//! Decoding then re-encoding yields a structurally equivalent document:
//! links stay links, embedded resources stay embedded, body fields are
//! unchanged, and single values stay single. Byte-identical output is not a
//! goal; for instance CURIE definitions are only written back when a
//! relation is compacted with them.
//!
//! # Formats
//!
//! | Name | MIME type |
//! |------|-----------|
//! | `hal` | `application/hal+json` |
//! | `uhf` | `application/vnd.uhf+json` |

mod adapter;
mod affordance;
mod curie;
mod error;
pub mod hal;
mod keys;
mod loader;
mod resource;
mod types;
mod uhf;
mod validator;

pub use adapter::{
    detect_format, parse_json, Adapter, AdapterDescriptor, BaseSerialization, Registry,
};
pub use affordance::{decode_link, encode_affordance, find_self_href, is_link_like};
pub use curie::{
    ingest_definitions, CurieToken, Expansion, PrefixTable, RenameMap, ResolvedRelation,
};
pub use error::{ConvertError, SchemaError};
pub use hal::{HalAdapter, HAL_MIME_TYPE};
pub use keys::{derive_relations, IndexedKey, KeyAllocator, CURIE_NAMES, HEAD_KEYS};
pub use loader::{is_url, load_document, load_document_auto};
pub use resource::{attach, decode_embedded, encode_embedded};
pub use types::{
    Affordance, Body, CurieDefinition, Document, EmbeddedResource, HalOptions, Head, Node,
    CURIE_RELATION, SELF_RELATION,
};
pub use uhf::{document_from_value, document_to_value, UhfAdapter, UHF_MIME_TYPE};
pub use validator::{uhf_schema, validate_uhf};

#[cfg(feature = "remote")]
pub use loader::load_document_url;
