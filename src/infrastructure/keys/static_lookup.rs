//! Single fixed verification key.

use async_trait::async_trait;
use jsonwebtoken::DecodingKey;

use crate::domain::repositories::KeyLookup;
use crate::error::AuthError;

/// Resolves exactly one kid to one key.
///
/// Suitable when rotation is not needed; every other kid is unknown.
#[derive(Clone)]
pub struct StaticKeyLookup {
    kid: String,
    key: DecodingKey,
}

impl StaticKeyLookup {
    pub fn new(kid: impl Into<String>, key: DecodingKey) -> Self {
        Self {
            kid: kid.into(),
            key,
        }
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }
}

#[async_trait]
impl KeyLookup for StaticKeyLookup {
    async fn resolve(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        if kid == self.kid {
            Ok(self.key.clone())
        } else {
            Err(AuthError::UnknownKeyId(kid.to_string()))
        }
    }
}
