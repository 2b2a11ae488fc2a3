//! Error types for document conversion.
//!
//! Only malformed input is an error. Unresolvable CURIEs, links without a
//! target and ambiguous cardinality are mapped by policy and never surface
//! here.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while loading, parsing or converting a document.
#[derive(Debug, Error)]
pub enum ConvertError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("expected a JSON object at the document root, got {actual}")]
    NotAnObject { actual: String },

    #[error("embedding depth exceeds the limit of {limit}")]
    DepthExceeded { limit: usize },

    #[error("unknown format \"{format}\"")]
    UnknownFormat { format: String },

    // Validation errors (exit code 1)
    #[error("invalid UHF document: {} error(s)", errors.len())]
    InvalidDocument { errors: Vec<SchemaError> },
}

impl ConvertError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConvertError::FileNotFound { .. } | ConvertError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            ConvertError::NetworkError { .. } => 3,
            ConvertError::InvalidDocument { .. } => 1,
            _ => 2,
        }
    }

    /// True for errors caused by text that is not a well-formed document.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            ConvertError::InvalidJson { .. } | ConvertError::NotAnObject { .. }
        )
    }
}

/// Single validation error with path context.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SchemaError {
    /// JSON Pointer (RFC 6901) to the invalid field.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_error_exit_codes() {
        let err = ConvertError::FileNotFound {
            path: PathBuf::from("doc.json"),
        };
        assert_eq!(err.exit_code(), 3);

        let err = ConvertError::NotAnObject {
            actual: "array".into(),
        };
        assert_eq!(err.exit_code(), 2);

        let err = ConvertError::UnknownFormat {
            format: "siren".into(),
        };
        assert_eq!(err.exit_code(), 2);

        let err = ConvertError::InvalidDocument { errors: vec![] };
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn parse_errors_are_classified() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(ConvertError::InvalidJson { source }.is_parse_error());
        assert!(ConvertError::NotAnObject {
            actual: "string".into()
        }
        .is_parse_error());
        assert!(!ConvertError::DepthExceeded { limit: 4 }.is_parse_error());
    }

    #[test]
    fn schema_error_display() {
        let err = SchemaError {
            path: "/head/self/rel".into(),
            message: "\"self\" is not of type \"array\"".into(),
        };
        assert_eq!(
            err.to_string(),
            "/head/self/rel: \"self\" is not of type \"array\""
        );
    }
}
