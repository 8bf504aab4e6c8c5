//! Short code generation and validation.
//!
//! Codes use the URL-safe base64 alphabet `[A-Za-z0-9_-]` (64 symbols).
//! Generated codes are [`GENERATED_CODE_LENGTH`] characters long, giving
//! 64^6 ≈ 68.7 billion combinations; caller-supplied codes may be 1 to
//! [`MAX_CUSTOM_CODE_LENGTH`] characters.

use crate::error::AppError;
use base64::Engine as _;
use regex::Regex;
use serde_json::json;
use std::sync::LazyLock;

/// Length of a randomly generated code.
pub const GENERATED_CODE_LENGTH: usize = 6;

/// Maximum length of a caller-supplied code.
pub const MAX_CUSTOM_CODE_LENGTH: usize = 20;

/// Random bytes drawn per code. Six bytes encode to eight base64 symbols;
/// the first six carry 36 uniformly random bits.
const CODE_ENTROPY_BYTES: usize = 6;

/// Shape of any short code accepted by the service.
pub static SHORT_CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,20}$").expect("static regex"));

/// Codes that would be shadowed by fixed routes.
const RESERVED_CODES: &[&str] = &["health"];

/// Generates a random short code from the OS entropy source.
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the system random number generator fails.
pub fn generate_code() -> Result<String, AppError> {
    let mut buffer = [0u8; CODE_ENTROPY_BYTES];

    getrandom::fill(&mut buffer).map_err(|e| {
        tracing::error!(error = %e, "OS random number generator failed");
        AppError::internal("Failed to generate short code", json!({}))
    })?;

    let mut code = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buffer);
    code.truncate(GENERATED_CODE_LENGTH);
    Ok(code)
}

/// Returns true if `code` has the shape of a short code (alphabet and length).
pub fn is_valid_code(code: &str) -> bool {
    SHORT_CODE_REGEX.is_match(code)
}

/// Validates a short code received as a lookup key.
///
/// # Errors
///
/// Returns [`AppError::Validation`] if the code is empty, longer than
/// [`MAX_CUSTOM_CODE_LENGTH`] or contains characters outside `[A-Za-z0-9_-]`.
pub fn validate_code(code: &str) -> Result<(), AppError> {
    if code.is_empty() || code.len() > MAX_CUSTOM_CODE_LENGTH {
        return Err(AppError::bad_request(
            "Short code must be 1-20 characters",
            json!({ "provided_length": code.len() }),
        ));
    }

    if !is_valid_code(code) {
        return Err(AppError::bad_request(
            "Short code may only contain a-z, A-Z, 0-9, _ and - characters",
            json!({ "code": code }),
        ));
    }

    Ok(())
}

/// Validates a caller-supplied custom code before any store access.
///
/// Same rules as [`validate_code`], and the code must not be reserved for a
/// fixed route.
///
/// # Errors
///
/// Returns [`AppError::Validation`] if any rule is violated.
pub fn validate_custom_code(code: &str) -> Result<(), AppError> {
    validate_code(code)?;

    if RESERVED_CODES.contains(&code) {
        return Err(AppError::bad_request(
            "This code is reserved",
            json!({ "code": code }),
        ));
    }

    Ok(())
}
