//! Document loading from files and HTTP URLs.
//!
//! Loaders return raw text; parsing belongs to the adapters.

use std::path::Path;

use crate::error::ConvertError;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Accept header sent when fetching documents.
#[cfg(feature = "remote")]
const ACCEPT: &str = "application/hal+json, application/vnd.uhf+json;q=0.9, application/json;q=0.8";

/// Load a document from a file path.
///
/// # Errors
///
/// Returns `ConvertError::FileNotFound` if the file doesn't exist,
/// or `ConvertError::ReadError` if it can't be read.
pub fn load_document(path: &Path) -> Result<String, ConvertError> {
    if !path.exists() {
        return Err(ConvertError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    std::fs::read_to_string(path).map_err(|source| ConvertError::ReadError {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a document from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `ConvertError::NetworkError` if the request fails or the server
/// answers with an error status.
#[cfg(feature = "remote")]
pub fn load_document_url(url: &str) -> Result<String, ConvertError> {
    let network_error = |source| ConvertError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network_error)?;

    tracing::debug!(url, "fetching document");
    client
        .get(url)
        .header(reqwest::header::ACCEPT, ACCEPT)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.text())
        .map_err(network_error)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load a document from a file path or URL.
///
/// URL loading requires the `remote` feature; without it URLs are reported
/// as missing files.
pub fn load_document_auto(source: &str) -> Result<String, ConvertError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_document_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(ConvertError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        load_document(Path::new(source))
    }
}
