//! Rotating set of verification keys.
//!
//! Rotation runs in three steps:
//!
//! 1. [`KeyRing::publish`] the new kid so tokens signed with it verify;
//! 2. restart (or rebuild the authenticator) with the new signing key active;
//! 3. [`KeyRing::retire`] the old kid once the longest token lifetime has passed.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey};
use tokio::sync::RwLock;

use super::pem::{PUBLIC_KEY_SUFFIX, decoding_key_from_pem};
use crate::domain::repositories::KeyLookup;
use crate::error::AuthError;

/// Thread-safe map of kid to verification key.
#[derive(Default)]
pub struct KeyRing {
    keys: RwLock<HashMap<String, DecodingKey>>,
}

impl KeyRing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `kid` resolvable, replacing any key previously published under it.
    pub async fn publish(&self, kid: impl Into<String>, key: DecodingKey) {
        let kid = kid.into();
        tracing::info!(kid = %kid, "Verification key published");
        self.keys.write().await.insert(kid, key);
    }

    /// Stops resolving `kid`. Returns false if it was not published.
    pub async fn retire(&self, kid: &str) -> bool {
        let removed = self.keys.write().await.remove(kid).is_some();
        if removed {
            tracing::info!(kid, "Verification key retired");
        }
        removed
    }

    /// Published kids, sorted.
    pub async fn kids(&self) -> Vec<String> {
        let mut kids: Vec<String> = self.keys.read().await.keys().cloned().collect();
        kids.sort();
        kids
    }

    pub async fn len(&self) -> usize {
        self.keys.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.keys.read().await.is_empty()
    }

    /// Publishes every `<kid>.pub.pem` file found directly in `dir`.
    ///
    /// Returns the number of keys loaded. Files with other names are skipped;
    /// a matching file that does not parse is an error.
    pub async fn load_dir(&self, algorithm: Algorithm, dir: impl AsRef<Path>) -> Result<usize, AuthError> {
        let dir = dir.as_ref();
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| AuthError::InvalidKey(format!("{}: {e}", dir.display())))?;

        let mut loaded = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AuthError::InvalidKey(format!("{}: {e}", dir.display())))?
        {
            let file_name = entry.file_name();
            let Some(kid) = file_name
                .to_str()
                .and_then(|name| name.strip_suffix(PUBLIC_KEY_SUFFIX))
                .filter(|kid| !kid.is_empty())
            else {
                continue;
            };

            let path = entry.path();
            let pem = tokio::fs::read(&path)
                .await
                .map_err(|e| AuthError::InvalidKey(format!("{}: {e}", path.display())))?;
            let key = decoding_key_from_pem(algorithm, &pem)
                .map_err(|e| AuthError::InvalidKey(format!("{}: {e}", path.display())))?;

            self.publish(kid, key).await;
            loaded += 1;
        }

        Ok(loaded)
    }
}

#[async_trait]
impl KeyLookup for KeyRing {
    async fn resolve(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        self.keys
            .read()
            .await
            .get(kid)
            .cloned()
            .ok_or_else(|| AuthError::UnknownKeyId(kid.to_string()))
    }
}
