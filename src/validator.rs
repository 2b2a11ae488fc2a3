//! Structural validation of UHF documents.

use serde_json::{json, Value};

use crate::error::{ConvertError, SchemaError};

/// JSON Schema describing a UHF document.
pub fn uhf_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$ref": "#/$defs/document",
        "$defs": {
            "document": {
                "type": "object",
                "properties": {
                    "head": { "$ref": "#/$defs/head" },
                    "body": { "type": "object" }
                },
                "additionalProperties": false
            },
            "head": {
                "type": "object",
                "additionalProperties": { "$ref": "#/$defs/node" }
            },
            "node": {
                "type": "object",
                "properties": {
                    "action": { "type": "string" },
                    "rel": { "type": "array", "items": { "type": "string" } },
                    "title": { "type": "string" },
                    "contentType": { "type": "string" },
                    "templated": { "type": "boolean" },
                    "singular": { "type": "boolean" },
                    "safeCurie": { "type": "boolean" },
                    "extensions": { "type": "object" },
                    "head": { "$ref": "#/$defs/head" },
                    "body": { "type": "object" }
                }
            }
        }
    })
}

/// Validate a value against the UHF schema, collecting every failure.
///
/// # Errors
///
/// Returns `ConvertError::InvalidDocument` listing each violation.
pub fn validate_uhf(value: &Value) -> Result<(), ConvertError> {
    validate_against_schema(&uhf_schema(), value)
}

/// Validate a value against an arbitrary schema.
pub fn validate_against_schema(schema: &Value, value: &Value) -> Result<(), ConvertError> {
    let validator = jsonschema::validator_for(schema).map_err(|e| ConvertError::InvalidDocument {
        errors: vec![SchemaError {
            path: String::new(),
            message: format!("invalid schema: {}", e),
        }],
    })?;

    let errors: Vec<SchemaError> = validator
        .iter_errors(value)
        .map(|e| SchemaError {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConvertError::InvalidDocument { errors })
    }
}
