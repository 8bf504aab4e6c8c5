//! Verification key lookup used by the token authenticator.

use async_trait::async_trait;
use jsonwebtoken::DecodingKey;

use crate::error::AuthError;

/// Resolves a key id (`kid`) to the public key that verifies tokens signed
/// under it.
///
/// Several kids may resolve at once, which lets tokens signed with an old key
/// stay valid while a new key takes over signing. Implementations may cache;
/// the authenticator itself never keeps a resolved key beyond one
/// verification.
///
/// # Implementations
///
/// - [`crate::infrastructure::keys::StaticKeyLookup`] - a single fixed key
/// - [`crate::infrastructure::keys::KeyRing`] - a set of keys with publish/retire
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyLookup: Send + Sync {
    /// Returns the verification key for `kid`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UnknownKeyId`] when the kid is not recognised.
    async fn resolve(&self, kid: &str) -> Result<DecodingKey, AuthError>;
}
