//! DTOs for short link endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::{Link, LinkPatch};
use crate::utils::code_generator::SHORT_CODE_REGEX;
use crate::utils::url_normalizer::MAX_URL_LENGTH;

// `validator` length bounds are `u64`.
const MAX_URL_LENGTH_U64: u64 = MAX_URL_LENGTH as u64;

/// Request body of `POST /v1/url/create` and `POST /v1/user/url/create`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUrlRequest {
    /// Target of the redirect (HTTP or HTTPS).
    #[validate(url(message = "Invalid URL format"))]
    #[validate(length(max = MAX_URL_LENGTH_U64))]
    pub url: String,

    /// Caller-chosen short code. Generated when absent.
    #[validate(regex(
        path = *SHORT_CODE_REGEX,
        message = "must contain only a-z, A-Z, 0-9, _, - characters (max 20)"
    ))]
    pub code: Option<String>,

    /// Defaults to the configured link lifetime.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Request body of `PUT /v1/url`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUrlRequest {
    #[validate(regex(
        path = *SHORT_CODE_REGEX,
        message = "must contain only a-z, A-Z, 0-9, _, - characters (max 20)"
    ))]
    pub code: String,

    #[validate(url(message = "Invalid URL format"))]
    #[validate(length(max = MAX_URL_LENGTH_U64))]
    pub url: Option<String>,

    pub expires_at: Option<DateTime<Utc>>,
}

impl UpdateUrlRequest {
    /// Splits the request into the addressed code and the fields to change.
    pub fn into_parts(self) -> (String, LinkPatch) {
        (
            self.code,
            LinkPatch {
                long_url: self.url,
                expires_at: self.expires_at,
            },
        )
    }
}

/// Public view of a short link.
#[derive(Debug, Serialize, Deserialize)]
pub struct UrlResponse {
    pub code: String,
    pub short_url: String,
    pub long_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl UrlResponse {
    pub fn from_link(link: Link, short_url: String) -> Self {
        Self {
            code: link.code,
            short_url,
            long_url: link.long_url,
            owner_id: link.owner_id,
            created_at: link.created_at,
            updated_at: link.updated_at,
            expires_at: link.expires_at,
        }
    }
}
