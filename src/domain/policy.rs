//! Owner-or-admin authorization policy.
//!
//! Every update or delete of a link or user account goes through
//! [`is_authorized`]. Reads are not owner-gated.

use serde_json::json;

use crate::domain::entities::Claims;
use crate::error::AppError;

/// Returns true if `claims` may mutate a resource owned by `owner_id`.
///
/// Holds iff the caller is the owner or carries the `admin` role. An empty
/// `owner_id` (anonymous resource) never matches by subject, so only admins
/// pass.
pub fn is_authorized(claims: &Claims, owner_id: &str) -> bool {
    if claims.is_admin() {
        return true;
    }

    !owner_id.is_empty() && claims.subject() == owner_id
}

/// Like [`is_authorized`] but yields [`AppError::Forbidden`] on refusal.
pub fn ensure_authorized(claims: &Claims, owner_id: &str, resource: &str) -> Result<(), AppError> {
    if is_authorized(claims, owner_id) {
        return Ok(());
    }

    tracing::warn!(
        subject = claims.subject(),
        resource,
        "Mutation refused by owner-or-admin policy"
    );
    Err(AppError::forbidden(
        "Forbidden",
        json!({ "reason": "Only the owner or an administrator may modify this resource" }),
    ))
}
