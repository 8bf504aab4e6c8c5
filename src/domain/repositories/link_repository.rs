//! Repository trait for short link data access.

use crate::domain::entities::{Link, NewLink};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository interface for short-link records.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryLinkRepository`] - in-process store
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Finds a link by its short code.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Link))` if found
    /// - `Ok(None)` if not found
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on store errors.
    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError>;

    /// Inserts a new link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the code is already taken. The
    /// store's unique constraint is authoritative even after a successful
    /// pre-check.
    ///
    /// Returns [`AppError::Internal`] on store errors.
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError>;

    /// Writes back every mutable field of `link`, matched by code.
    ///
    /// Returns `Ok(false)` when no record matched.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on store errors.
    async fn update(&self, link: &Link) -> Result<bool, AppError>;

    /// Deletes a link by code.
    ///
    /// Returns `Ok(false)` when no record matched.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on store errors.
    async fn delete(&self, code: &str) -> Result<bool, AppError>;

    /// Deletes the link with `code` only if it has expired as of `now`.
    ///
    /// Check and removal are one step, so a live link that replaced the
    /// expired one in the meantime is never touched.
    ///
    /// Returns `Ok(false)` when no expired record matched.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on store errors.
    async fn delete_expired(&self, code: &str, now: DateTime<Utc>) -> Result<bool, AppError>;
}
