//! Format adapters and the registry that dispatches between them.
//!
//! Each adapter maps one hypermedia format to and from the canonical
//! [`Document`]. The registry is an ordinary value built by the caller; the
//! codecs themselves never consult it.

use serde::Serialize;
use serde_json::Value;

use crate::error::ConvertError;
use crate::hal::{HalAdapter, HAL_MIME_TYPE};
use crate::types::{Document, HalOptions};
use crate::uhf::{UhfAdapter, UHF_MIME_TYPE};

/// Serialization an adapter's format is layered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseSerialization {
    Json,
}

/// Registration details for an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdapterDescriptor {
    pub name: &'static str,
    pub base: BaseSerialization,
    pub mime_type: &'static str,
}

impl AdapterDescriptor {
    /// Matches by name or by MIME type, ignoring ASCII case.
    pub fn matches(&self, format: &str) -> bool {
        self.name.eq_ignore_ascii_case(format) || self.mime_type.eq_ignore_ascii_case(format)
    }
}

/// Converts between one format and the canonical document.
pub trait Adapter {
    fn descriptor(&self) -> AdapterDescriptor;

    /// Canonical document from an already parsed source value.
    fn decode(&self, value: &Value) -> Result<Document, ConvertError>;

    /// Source value from a canonical document. Never fails.
    fn encode(&self, doc: &Document) -> Value;

    /// Parse and decode raw text.
    ///
    /// # Errors
    ///
    /// Returns `ConvertError::InvalidJson` if `raw` is not well-formed JSON,
    /// plus whatever the adapter's [`decode`](Adapter::decode) reports.
    fn to_uhf(&self, raw: &str) -> Result<Document, ConvertError> {
        let value = parse_json(raw)?;
        self.decode(&value)
    }

    /// Encode and serialize a canonical document.
    fn from_uhf(&self, doc: &Document) -> String {
        self.encode(doc).to_string()
    }
}

/// Parse raw text as JSON.
pub fn parse_json(raw: &str) -> Result<Value, ConvertError> {
    serde_json::from_str(raw).map_err(|source| ConvertError::InvalidJson { source })
}

/// Guess the format of a parsed document.
///
/// An object with an object `head` and at most an object `body` besides is
/// UHF. Any other object is HAL, including `{"body": {...}}` on its own,
/// which is ordinary HAL data.
pub fn detect_format(value: &Value) -> Result<&'static str, ConvertError> {
    let Value::Object(map) = value else {
        return Err(ConvertError::NotAnObject {
            actual: crate::types::json_type_name(value).to_string(),
        });
    };

    let is_uhf = map.get("head").is_some_and(Value::is_object)
        && map
            .iter()
            .all(|(name, member)| matches!(name.as_str(), "head" | "body") && member.is_object());

    Ok(if is_uhf { UHF_MIME_TYPE } else { HAL_MIME_TYPE })
}

/// Adapters available for conversion, looked up by name or MIME type.
#[derive(Default)]
pub struct Registry {
    adapters: Vec<Box<dyn Adapter>>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// HAL and UHF adapters with default options.
    pub fn with_defaults() -> Self {
        Self::with_hal_options(HalOptions::default())
    }

    /// HAL and UHF adapters, HAL configured with `options`.
    pub fn with_hal_options(options: HalOptions) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(HalAdapter::new(options)));
        registry.register(Box::new(UhfAdapter));
        registry
    }

    /// Add an adapter. A later registration for the same name shadows
    /// earlier ones.
    pub fn register(&mut self, adapter: Box<dyn Adapter>) {
        self.adapters.insert(0, adapter);
    }

    pub fn descriptors(&self) -> Vec<AdapterDescriptor> {
        let mut descriptors: Vec<_> = self.adapters.iter().map(|a| a.descriptor()).collect();
        descriptors.reverse();
        descriptors
    }

    /// Adapter for a name or MIME type.
    pub fn lookup(&self, format: &str) -> Result<&dyn Adapter, ConvertError> {
        self.adapters
            .iter()
            .find(|adapter| adapter.descriptor().matches(format))
            .map(|adapter| adapter.as_ref())
            .ok_or_else(|| ConvertError::UnknownFormat {
                format: format.to_string(),
            })
    }

    /// Decode `raw` from format `from` (detected when `None`) and encode it
    /// as format `to`.
    pub fn convert(&self, raw: &str, from: Option<&str>, to: &str) -> Result<Value, ConvertError> {
        let target = self.lookup(to)?;
        let value = parse_json(raw)?;
        let source = match from {
            Some(format) => self.lookup(format)?,
            None => self.lookup(detect_format(&value)?)?,
        };

        tracing::debug!(
            from = source.descriptor().name,
            to = target.descriptor().name,
            "converting document"
        );
        let doc = source.decode(&value)?;
        Ok(target.encode(&doc))
    }
}
