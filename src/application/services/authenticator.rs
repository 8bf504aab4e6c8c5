//! Signed identity tokens with key rotation.
//!
//! Tokens are compact JWS strings whose header names the signing key (`kid`).
//! Verification pins the algorithm chosen at construction and never trusts
//! the one a token declares; this rules out `alg: none` and key-confusion
//! forgeries. The verification key is resolved through a [`KeyLookup`], so
//! several kids can be live at once while keys rotate.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, EncodingKey, Header, Validation, decode, decode_header, encode};
use metrics::counter;

use crate::domain::entities::Claims;
use crate::domain::repositories::KeyLookup;
use crate::error::AuthError;
use crate::infrastructure::keys::{encoding_key_from_pem, parse_algorithm};

/// Algorithm used when none is configured.
pub const DEFAULT_ALGORITHM: &str = "EdDSA";

/// Issues and verifies identity tokens.
///
/// Holds exactly one active signing key. Shared read-only across requests.
pub struct Authenticator {
    encoding_key: EncodingKey,
    active_kid: String,
    algorithm: Algorithm,
    key_lookup: Arc<dyn KeyLookup>,
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator")
            .field("active_kid", &self.active_kid)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl Authenticator {
    /// Creates an authenticator.
    ///
    /// # Errors
    ///
    /// - [`AuthError::BlankKeyId`] if `active_kid` is empty or whitespace
    /// - [`AuthError::UnsupportedAlgorithm`] for unknown or symmetric algorithms
    /// - [`AuthError::InvalidKey`] if the key can't sign under `algorithm`
    pub fn new(
        encoding_key: EncodingKey,
        active_kid: impl Into<String>,
        algorithm: &str,
        key_lookup: Arc<dyn KeyLookup>,
    ) -> Result<Self, AuthError> {
        Self::builder()
            .signing_key(encoding_key)
            .active_kid(active_kid)
            .algorithm(algorithm)
            .key_lookup(key_lookup)
            .build()
    }

    pub fn builder() -> AuthenticatorBuilder {
        AuthenticatorBuilder::default()
    }

    pub fn active_kid(&self) -> &str {
        &self.active_kid
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Signs `claims` with the active key.
    ///
    /// The header carries the pinned algorithm and the active kid.
    pub fn issue_token(&self, claims: &Claims) -> Result<String, AuthError> {
        let mut header = Header::new(self.algorithm);
        header.kid = Some(self.active_kid.clone());

        let token = encode(&header, claims, &self.encoding_key).map_err(|e| {
            tracing::error!(error = %e, kid = %self.active_kid, "Token signing failed");
            AuthError::Signing(e)
        })?;

        counter!("auth_tokens_issued_total").increment(1);
        tracing::debug!(sub = %claims.sub, kid = %self.active_kid, "Token issued");
        Ok(token)
    }

    /// Verifies `token` against the current time.
    pub async fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_token_at(token, Utc::now()).await
    }

    /// Verifies `token` as of `now`.
    ///
    /// Steps, in order: header decode, algorithm pin, kid resolution,
    /// signature, validity window `[iat, exp)`.
    pub async fn verify_token_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let result = self.verify_inner(token, now).await;

        if let Err(e) = &result {
            counter!("auth_token_rejections_total", "reason" => e.reason()).increment(1);
            tracing::debug!(reason = e.reason(), error = %e, "Token verification failed");
        }

        result
    }

    async fn verify_inner(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::MalformedToken(e.to_string()))?;

        if header.alg != self.algorithm {
            return Err(AuthError::AlgorithmMismatch {
                expected: format!("{:?}", self.algorithm),
                found: format!("{:?}", header.alg),
            });
        }

        let kid = header
            .kid
            .filter(|kid| !kid.is_empty())
            .ok_or(AuthError::MissingKeyId)?;

        let key = self.key_lookup.resolve(&kid).await?;

        let mut validation = Validation::new(self.algorithm);
        // The window is checked below against the caller's clock, without leeway.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<Claims>(token, &key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::InvalidAlgorithm => AuthError::AlgorithmMismatch {
                    expected: format!("{:?}", self.algorithm),
                    found: "unknown".to_string(),
                },
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::MalformedToken(e.to_string()),
            })?
            .claims;

        if claims.exp <= claims.iat {
            return Err(AuthError::MalformedToken(
                "expiry is not after issue time".to_string(),
            ));
        }

        if !claims.is_valid_at(now) {
            return Err(if now.timestamp() < claims.iat {
                AuthError::NotYetValid
            } else {
                AuthError::Expired
            });
        }

        Ok(claims)
    }
}

/// Step-by-step construction of an [`Authenticator`].
///
/// [`build`](Self::build) reports the first missing or invalid part.
#[derive(Default)]
pub struct AuthenticatorBuilder {
    signing_key: Option<EncodingKey>,
    signing_key_pem: Option<Vec<u8>>,
    active_kid: Option<String>,
    algorithm: Option<String>,
    key_lookup: Option<Arc<dyn KeyLookup>>,
}

impl AuthenticatorBuilder {
    pub fn signing_key(mut self, key: EncodingKey) -> Self {
        self.signing_key = Some(key);
        self
    }

    /// Signing key as PEM, parsed for the configured algorithm at build time.
    pub fn signing_key_pem(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.signing_key_pem = Some(pem.into());
        self
    }

    pub fn active_kid(mut self, kid: impl Into<String>) -> Self {
        self.active_kid = Some(kid.into());
        self
    }

    /// Defaults to [`DEFAULT_ALGORITHM`].
    pub fn algorithm(mut self, name: impl Into<String>) -> Self {
        self.algorithm = Some(name.into());
        self
    }

    pub fn key_lookup(mut self, lookup: Arc<dyn KeyLookup>) -> Self {
        self.key_lookup = Some(lookup);
        self
    }

    pub fn build(self) -> Result<Authenticator, AuthError> {
        let algorithm =
            parse_algorithm(self.algorithm.as_deref().unwrap_or(DEFAULT_ALGORITHM))?;

        let encoding_key = match (self.signing_key, self.signing_key_pem) {
            (Some(key), _) => key,
            (None, Some(pem)) => encoding_key_from_pem(algorithm, &pem)?,
            (None, None) => return Err(AuthError::MissingSigningKey),
        };

        let active_kid = self
            .active_kid
            .filter(|kid| !kid.trim().is_empty())
            .ok_or(AuthError::BlankKeyId)?;

        let key_lookup = self.key_lookup.ok_or(AuthError::MissingKeyLookup)?;

        // The key must be able to sign under the pinned algorithm.
        encode(&Header::new(algorithm), &serde_json::json!({}), &encoding_key).map_err(|e| {
            AuthError::InvalidKey(format!("signing key does not fit {algorithm:?}: {e}"))
        })?;

        Ok(Authenticator {
            encoding_key,
            active_kid,
            algorithm,
            key_lookup,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Role;
    use crate::domain::repositories::MockKeyLookup;
    use crate::infrastructure::keys::{
        GeneratedKeyPair, KeyRing, StaticKeyLookup, generate_ed25519_keypair,
    };
    use base64::Engine as _;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use chrono::Duration as ChronoDuration;
    use std::time::Duration;

    const TTL: Duration = Duration::from_secs(3600);

    fn static_authenticator(pair: &GeneratedKeyPair) -> Authenticator {
        let lookup = StaticKeyLookup::new(pair.kid.clone(), pair.decoding_key().unwrap());
        Authenticator::new(
            pair.encoding_key().unwrap(),
            pair.kid.clone(),
            "EdDSA",
            Arc::new(lookup),
        )
        .unwrap()
    }

    fn user_claims(now: DateTime<Utc>) -> Claims {
        Claims::new("user-1", [Role::User], now, TTL)
    }

    #[tokio::test]
    async fn test_issue_then_verify_round_trip() {
        let pair = generate_ed25519_keypair().unwrap();
        let auth = static_authenticator(&pair);
        let claims = Claims::new("user-1", [Role::User, Role::Admin], Utc::now(), TTL);

        let token = auth.issue_token(&claims).unwrap();
        let verified = auth.verify_token(&token).await.unwrap();

        assert_eq!(verified, claims);
    }

    #[tokio::test]
    async fn test_header_names_active_kid() {
        let pair = generate_ed25519_keypair().unwrap();
        let auth = static_authenticator(&pair);

        let token = auth.issue_token(&user_claims(Utc::now())).unwrap();
        let header = decode_header(&token).unwrap();

        assert_eq!(header.kid.as_deref(), Some(pair.kid.as_str()));
        assert_eq!(header.alg, Algorithm::EdDSA);
    }

    #[tokio::test]
    async fn test_unknown_kid_is_rejected() {
        let signer = generate_ed25519_keypair().unwrap();
        let other = generate_ed25519_keypair().unwrap();

        let issuing = static_authenticator(&signer);
        let verifying = static_authenticator(&other);

        let token = issuing.issue_token(&user_claims(Utc::now())).unwrap();
        let err = verifying.verify_token(&token).await.unwrap_err();

        assert!(matches!(err, AuthError::UnknownKeyId(kid) if kid == signer.kid));
    }

    #[tokio::test]
    async fn test_wrong_key_under_known_kid_is_invalid_signature() {
        let real = generate_ed25519_keypair().unwrap();
        let forger = generate_ed25519_keypair().unwrap();

        let verifying = static_authenticator(&real);
        let forging = Authenticator::new(
            forger.encoding_key().unwrap(),
            real.kid.clone(),
            "EdDSA",
            Arc::new(StaticKeyLookup::new(
                real.kid.clone(),
                real.decoding_key().unwrap(),
            )),
        )
        .unwrap();

        let token = forging.issue_token(&user_claims(Utc::now())).unwrap();
        let err = verifying.verify_token(&token).await.unwrap_err();

        assert!(matches!(err, AuthError::InvalidSignature));
    }

    #[tokio::test]
    async fn test_foreign_algorithm_is_rejected_before_lookup() {
        let pair = generate_ed25519_keypair().unwrap();
        let mut lookup = MockKeyLookup::new();
        lookup.expect_resolve().never();

        let auth = Authenticator::new(
            pair.encoding_key().unwrap(),
            pair.kid.clone(),
            "EdDSA",
            Arc::new(lookup),
        )
        .unwrap();

        // HMAC token keyed with the public key bytes: the classic confusion attack.
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(pair.kid.clone());
        let token = encode(
            &header,
            &user_claims(Utc::now()),
            &EncodingKey::from_secret(pair.public_pem.as_bytes()),
        )
        .unwrap();

        let err = auth.verify_token(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::AlgorithmMismatch { .. }));
    }

    #[tokio::test]
    async fn test_alg_none_is_rejected() {
        let pair = generate_ed25519_keypair().unwrap();
        let auth = static_authenticator(&pair);

        let header = URL_SAFE_NO_PAD.encode(format!(r#"{{"alg":"none","kid":"{}"}}"#, pair.kid));
        let now = Utc::now().timestamp();
        let payload = URL_SAFE_NO_PAD.encode(format!(
            r#"{{"sub":"admin","roles":["admin"],"iat":{now},"exp":{}}}"#,
            now + 3600
        ));
        let token = format!("{header}.{payload}.");

        assert!(auth.verify_token(&token).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_kid_is_rejected() {
        let pair = generate_ed25519_keypair().unwrap();
        let auth = static_authenticator(&pair);

        let token = encode(
            &Header::new(Algorithm::EdDSA),
            &user_claims(Utc::now()),
            &pair.encoding_key().unwrap(),
        )
        .unwrap();

        assert!(matches!(
            auth.verify_token(&token).await.unwrap_err(),
            AuthError::MissingKeyId
        ));
    }

    #[tokio::test]
    async fn test_validity_window() {
        let pair = generate_ed25519_keypair().unwrap();
        let auth = static_authenticator(&pair);
        let issued = Utc::now();
        let token = auth.issue_token(&user_claims(issued)).unwrap();

        assert!(auth.verify_token_at(&token, issued).await.is_ok());
        assert!(
            auth.verify_token_at(&token, issued + ChronoDuration::seconds(3599))
                .await
                .is_ok()
        );
        assert!(matches!(
            auth.verify_token_at(&token, issued + ChronoDuration::seconds(3600))
                .await
                .unwrap_err(),
            AuthError::Expired
        ));
        assert!(matches!(
            auth.verify_token_at(&token, issued - ChronoDuration::seconds(10))
                .await
                .unwrap_err(),
            AuthError::NotYetValid
        ));
    }

    #[tokio::test]
    async fn test_garbage_token_is_malformed() {
        let pair = generate_ed25519_keypair().unwrap();
        let auth = static_authenticator(&pair);

        for token in ["", "abc", "a.b.c"] {
            assert!(matches!(
                auth.verify_token(token).await.unwrap_err(),
                AuthError::MalformedToken(_)
            ));
        }
    }

    #[tokio::test]
    async fn test_rotation_through_key_ring() {
        let old = generate_ed25519_keypair().unwrap();
        let new = generate_ed25519_keypair().unwrap();

        let ring = Arc::new(KeyRing::new());
        ring.publish(old.kid.clone(), old.decoding_key().unwrap()).await;

        let before = Authenticator::new(
            old.encoding_key().unwrap(),
            old.kid.clone(),
            "EdDSA",
            ring.clone(),
        )
        .unwrap();
        let old_token = before.issue_token(&user_claims(Utc::now())).unwrap();

        // Publish, then switch the active key.
        ring.publish(new.kid.clone(), new.decoding_key().unwrap()).await;
        let after = Authenticator::new(
            new.encoding_key().unwrap(),
            new.kid.clone(),
            "EdDSA",
            ring.clone(),
        )
        .unwrap();
        let new_token = after.issue_token(&user_claims(Utc::now())).unwrap();

        assert!(after.verify_token(&old_token).await.is_ok());
        assert!(after.verify_token(&new_token).await.is_ok());

        // Retire the old kid: its tokens stop verifying, new ones are unaffected.
        ring.retire(&old.kid).await;
        assert!(matches!(
            after.verify_token(&old_token).await.unwrap_err(),
            AuthError::UnknownKeyId(_)
        ));
        assert!(after.verify_token(&new_token).await.is_ok());
    }

    #[test]
    fn test_builder_requires_every_part() {
        let pair = generate_ed25519_keypair().unwrap();
        let lookup = || -> Arc<dyn KeyLookup> {
            Arc::new(StaticKeyLookup::new("k", pair.decoding_key().unwrap()))
        };

        let err = Authenticator::builder()
            .active_kid("k")
            .key_lookup(lookup())
            .build()
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingSigningKey));

        let err = Authenticator::builder()
            .signing_key(pair.encoding_key().unwrap())
            .active_kid("  ")
            .key_lookup(lookup())
            .build()
            .unwrap_err();
        assert!(matches!(err, AuthError::BlankKeyId));

        let err = Authenticator::builder()
            .signing_key(pair.encoding_key().unwrap())
            .active_kid("k")
            .algorithm("HS256")
            .key_lookup(lookup())
            .build()
            .unwrap_err();
        assert!(matches!(err, AuthError::UnsupportedAlgorithm(_)));

        let err = Authenticator::builder()
            .signing_key(pair.encoding_key().unwrap())
            .active_kid("k")
            .algorithm("XYZ999")
            .key_lookup(lookup())
            .build()
            .unwrap_err();
        assert!(matches!(err, AuthError::UnsupportedAlgorithm(_)));

        let err = Authenticator::builder()
            .signing_key(pair.encoding_key().unwrap())
            .active_kid("k")
            .build()
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingKeyLookup));
    }

    #[test]
    fn test_builder_rejects_key_of_another_family() {
        let pair = generate_ed25519_keypair().unwrap();
        let lookup = || -> Arc<dyn KeyLookup> {
            Arc::new(StaticKeyLookup::new("k", pair.decoding_key().unwrap()))
        };

        let err = Authenticator::builder()
            .signing_key(pair.encoding_key().unwrap())
            .active_kid("k")
            .algorithm("RS256")
            .key_lookup(lookup())
            .build()
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidKey(_)));

        let err = Authenticator::builder()
            .signing_key(EncodingKey::from_secret(b"shared-secret"))
            .active_kid("k")
            .algorithm("EdDSA")
            .key_lookup(lookup())
            .build()
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn test_builder_from_pem_defaults_to_eddsa() {
        let pair = generate_ed25519_keypair().unwrap();
        let auth = Authenticator::builder()
            .signing_key_pem(pair.private_pem.clone())
            .active_kid(pair.kid.clone())
            .key_lookup(Arc::new(StaticKeyLookup::new(
                pair.kid.clone(),
                pair.decoding_key().unwrap(),
            )))
            .build()
            .unwrap();

        assert_eq!(auth.algorithm(), Algorithm::EdDSA);
        assert_eq!(auth.active_kid(), pair.kid);

        let token = auth.issue_token(&user_claims(Utc::now())).unwrap();
        assert!(auth.verify_token(&token).await.is_ok());
    }
}
