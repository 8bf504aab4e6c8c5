//! Repository trait for user accounts.

use crate::domain::entities::{NewUser, User};
use crate::error::AppError;
use async_trait::async_trait;
use uuid::Uuid;

/// Repository interface for user accounts.
///
/// Emails are unique; inserts or updates that would duplicate one fail with
/// [`AppError::Conflict`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Finds a user by id. `Ok(None)` if absent.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Finds a user by email. `Ok(None)` if absent.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Inserts a new user.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] on a duplicate email or id.
    async fn create(&self, new_user: NewUser) -> Result<User, AppError>;

    /// Writes back every mutable field of `user`. `Ok(false)` if no record matched.
    async fn update(&self, user: &User) -> Result<bool, AppError>;

    /// Deletes a user. `Ok(false)` if no record matched.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}
