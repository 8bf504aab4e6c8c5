//! Salted adaptive password hashing (bcrypt).
//!
//! Hashing and verification are CPU bound and run on the blocking pool.

use serde_json::json;

use crate::error::AppError;

/// Lowest cost bcrypt accepts; only suitable for tests.
pub const MIN_COST: u32 = 4;

/// Hashes `password` with a fresh salt at the given cost.
///
/// The plaintext is moved into the hashing task and dropped there.
///
/// # Errors
///
/// Returns [`AppError::Internal`] if hashing fails or the task is lost.
pub async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Password hashing task failed");
            AppError::internal("Failed to hash password", json!({}))
        })?
        .map_err(|e| {
            tracing::error!(error = %e, "Password hashing failed");
            AppError::internal("Failed to hash password", json!({}))
        })
}

/// Compares `password` with a stored bcrypt hash.
///
/// A malformed stored hash counts as a mismatch.
pub async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Password verification task failed");
            AppError::internal("Failed to verify password", json!({}))
        })?;

    match outcome {
        Ok(matches) => Ok(matches),
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is unreadable");
            Ok(false)
        }
    }
}
