//! Target URL validation and normalization.
//!
//! Links may only point at `http` or `https` targets. Hostnames are
//! lowercased, default ports and fragments are dropped; path and query are
//! kept as given.

use serde_json::json;
use url::Url;

use crate::error::AppError;

/// Longest target URL accepted, after normalization.
pub const MAX_URL_LENGTH: usize = 2048;

/// Errors that can occur during URL normalization.
#[derive(Debug, thiserror::Error)]
pub enum UrlNormalizationError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL is longer than {MAX_URL_LENGTH} characters")]
    TooLong,
}

impl From<UrlNormalizationError> for AppError {
    fn from(e: UrlNormalizationError) -> Self {
        AppError::bad_request("Invalid URL", json!({ "reason": e.to_string() }))
    }
}

/// Normalizes a target URL to its canonical form.
///
/// # Errors
///
/// - [`UrlNormalizationError::InvalidFormat`] for unparsable input
/// - [`UrlNormalizationError::UnsupportedProtocol`] for `javascript:`, `data:`,
///   `ftp:` and every other non-HTTP(S) scheme
/// - [`UrlNormalizationError::TooLong`] above [`MAX_URL_LENGTH`]
pub fn normalize_url(input: &str) -> Result<String, UrlNormalizationError> {
    let mut url =
        Url::parse(input).map_err(|e| UrlNormalizationError::InvalidFormat(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(UrlNormalizationError::UnsupportedProtocol);
    }

    if let Some(host) = url.host_str().map(str::to_ascii_lowercase) {
        url.set_host(Some(&host))
            .map_err(|e| UrlNormalizationError::InvalidFormat(e.to_string()))?;
    }

    url.set_fragment(None);

    // `Url` already omits a port equal to the scheme default; this covers the
    // explicit form as well.
    if matches!(
        (url.scheme(), url.port()),
        ("http", Some(80)) | ("https", Some(443))
    ) {
        let _ = url.set_port(None);
    }

    let normalized = String::from(url);
    if normalized.len() > MAX_URL_LENGTH {
        return Err(UrlNormalizationError::TooLong);
    }

    Ok(normalized)
}
