//! Error types shared by every layer of the service.
//!
//! [`AppError`] is the domain error taxonomy returned by services and
//! repositories and rendered as a JSON body by the HTTP layer.
//! [`AuthError`] is produced by the token [`Authenticator`](crate::application::services::Authenticator)
//! and key management code; it converts into [`AppError`] at the service boundary.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Machine-readable error payload.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

/// Domain error taxonomy.
///
/// Every variant is terminal for the call that produced it.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed input (bad id, bad short code, invalid payload).
    #[error("{message}")]
    Validation { message: String, details: Value },

    /// Bad credentials, or an invalid / expired token.
    #[error("{message}")]
    Unauthorized { message: String, details: Value },

    /// Authenticated caller is not allowed to mutate the resource.
    #[error("{message}")]
    Forbidden { message: String, details: Value },

    #[error("{message}")]
    NotFound { message: String, details: Value },

    /// Duplicate short code or email.
    #[error("{message}")]
    Conflict { message: String, details: Value },

    /// A mutation matched zero records.
    #[error("{message}")]
    NoAffected { message: String, details: Value },

    /// Store, crypto or deadline failure.
    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
    pub fn unauthorized(message: impl Into<String>, details: Value) -> Self {
        Self::Unauthorized {
            message: message.into(),
            details,
        }
    }
    pub fn forbidden(message: impl Into<String>, details: Value) -> Self {
        Self::Forbidden {
            message: message.into(),
            details,
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }
    pub fn no_affected(message: impl Into<String>, details: Value) -> Self {
        Self::NoAffected {
            message: message.into(),
            details,
        }
    }
    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// Internal error raised when an operation overruns its deadline.
    pub fn timeout(operation: &str, limit: std::time::Duration) -> Self {
        Self::internal(
            "Request timed out",
            json!({
                "reason": "deadline_exceeded",
                "operation": operation,
                "timeout_ms": limit.as_millis() as u64,
            }),
        )
    }

    /// Returns true for the deadline flavour of [`AppError::Internal`].
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Internal { details, .. } if details["reason"] == "deadline_exceeded"
        )
    }

    fn parts(&self) -> (StatusCode, &'static str, &String, &Value) {
        match self {
            AppError::Validation { message, details } => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                message,
                details,
            ),
            AppError::Unauthorized { message, details } => {
                (StatusCode::UNAUTHORIZED, "unauthorized", message, details)
            }
            AppError::Forbidden { message, details } => {
                (StatusCode::FORBIDDEN, "forbidden", message, details)
            }
            AppError::NotFound { message, details } => {
                (StatusCode::NOT_FOUND, "not_found", message, details)
            }
            AppError::Conflict { message, details } => {
                (StatusCode::CONFLICT, "conflict", message, details)
            }
            AppError::NoAffected { message, details } => {
                (StatusCode::NOT_FOUND, "no_affected", message, details)
            }
            AppError::Internal { message, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                message,
                details,
            ),
        }
    }

    /// HTTP status this error renders with.
    pub fn status_code(&self) -> StatusCode {
        self.parts().0
    }

    pub fn to_error_info(&self) -> ErrorInfo {
        let (_, code, message, details) = self.parts();
        ErrorInfo {
            code,
            message: message.clone(),
            details: details.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.to_error_info(),
        };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        map_sqlx_error(e)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        let details = serde_json::to_value(e.field_errors()).unwrap_or_else(|_| json!({}));
        AppError::bad_request("Validation failed", details)
    }
}

/// Maps a database error into the domain taxonomy.
///
/// Unique violations become [`AppError::Conflict`]; everything else is internal
/// and the driver error is only logged.
pub fn map_sqlx_error(e: sqlx::Error) -> AppError {
    if let Some(db) = e.as_database_error()
        && db.is_unique_violation()
    {
        return AppError::conflict(
            "Unique constraint violation",
            json!({ "constraint": db.constraint() }),
        );
    }

    tracing::error!(error = %e, "Database error");
    AppError::internal("Database error", json!({}))
}

/// Errors produced while building the authenticator, loading keys, or
/// issuing and verifying tokens.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("signing key is required")]
    MissingSigningKey,

    #[error("active key id can't be blank")]
    BlankKeyId,

    #[error("unsupported signing algorithm {0:?}")]
    UnsupportedAlgorithm(String),

    #[error("key lookup is required")]
    MissingKeyLookup,

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("can't sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("token header has no key id")]
    MissingKeyId,

    #[error("unrecognized key id {0:?}")]
    UnknownKeyId(String),

    #[error("token algorithm {found} does not match {expected}")]
    AlgorithmMismatch { expected: String, found: String },

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token is not valid yet")]
    NotYetValid,
}

impl AuthError {
    /// Short label used for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingSigningKey
            | AuthError::BlankKeyId
            | AuthError::UnsupportedAlgorithm(_)
            | AuthError::MissingKeyLookup
            | AuthError::InvalidKey(_) => "configuration",
            AuthError::Signing(_) => "signing",
            AuthError::MalformedToken(_) => "malformed",
            AuthError::MissingKeyId => "missing_kid",
            AuthError::UnknownKeyId(_) => "unknown_kid",
            AuthError::AlgorithmMismatch { .. } => "algorithm",
            AuthError::InvalidSignature => "signature",
            AuthError::Expired => "expired",
            AuthError::NotYetValid => "not_yet_valid",
        }
    }

    /// True when the error describes the presented token rather than the
    /// server's own configuration.
    pub fn is_token_rejection(&self) -> bool {
        !matches!(self.reason(), "configuration" | "signing")
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        if e.is_token_rejection() {
            // The reason stays in the logs; clients only learn that the token was refused.
            tracing::debug!(reason = e.reason(), error = %e, "Token rejected");
            AppError::unauthorized(
                "Unauthorized",
                json!({ "reason": "Invalid or expired token" }),
            )
        } else {
            tracing::error!(error = %e, "Authenticator failure");
            AppError::internal("Authentication subsystem error", json!({}))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::bad_request("x", json!({})), StatusCode::BAD_REQUEST),
            (AppError::unauthorized("x", json!({})), StatusCode::UNAUTHORIZED),
            (AppError::forbidden("x", json!({})), StatusCode::FORBIDDEN),
            (AppError::not_found("x", json!({})), StatusCode::NOT_FOUND),
            (AppError::conflict("x", json!({})), StatusCode::CONFLICT),
            (AppError::no_affected("x", json!({})), StatusCode::NOT_FOUND),
            (
                AppError::internal("x", json!({})),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.status_code(), status);
        }
    }

    #[test]
    fn test_unauthorized_response_has_challenge_header() {
        let response = AppError::unauthorized("Unauthorized", json!({})).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }

    #[test]
    fn test_timeout_is_internal() {
        let err = AppError::timeout("link.get", std::time::Duration::from_secs(2));
        assert!(matches!(err, AppError::Internal { .. }));
        assert!(err.is_timeout());
        assert!(!AppError::internal("Database error", json!({})).is_timeout());
    }

    #[test]
    fn test_token_rejections_map_to_unauthorized() {
        let err: AppError = AuthError::UnknownKeyId("old".into()).into();
        assert!(matches!(err, AppError::Unauthorized { .. }));

        let err: AppError = AuthError::Expired.into();
        assert!(matches!(err, AppError::Unauthorized { .. }));

        let err: AppError = AuthError::MissingSigningKey.into();
        assert!(matches!(err, AppError::Internal { .. }));
    }

    #[test]
    fn test_error_info_carries_code() {
        let info = AppError::no_affected("URL was not deleted", json!({"code": "abc"}))
            .to_error_info();
        assert_eq!(info.code, "no_affected");
        assert_eq!(info.message, "URL was not deleted");
        assert_eq!(info.details["code"], "abc");
    }
}
