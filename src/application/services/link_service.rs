//! Short link usecases: lookup, creation, update and deletion.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::counter;
use serde_json::json;

use crate::domain::entities::{Claims, Link, LinkPatch, NewLink};
use crate::domain::policy::ensure_authorized;
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::code_generator::{generate_code, validate_code, validate_custom_code};
use crate::utils::deadline::with_deadline;
use crate::utils::url_normalizer::normalize_url;

/// Candidate codes tried before giving up on generation.
pub const MAX_CODE_ATTEMPTS: usize = 10;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Lifetime of a link created without an explicit expiry.
pub const DEFAULT_LINK_LIFETIME_DAYS: i64 = 30;

/// Service for creating, reading and mutating short links.
///
/// Mutations are gated by the owner-or-admin policy. Every operation runs
/// under the configured deadline.
pub struct LinkService<L: LinkRepository + ?Sized> {
    link_repository: Arc<L>,
    timeout: Duration,
    link_lifetime: chrono::Duration,
}

impl<L: LinkRepository + ?Sized> LinkService<L> {
    /// Creates a link service with default deadline and link lifetime.
    pub fn new(link_repository: Arc<L>) -> Self {
        Self {
            link_repository,
            timeout: DEFAULT_TIMEOUT,
            link_lifetime: chrono::Duration::days(DEFAULT_LINK_LIFETIME_DAYS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_link_lifetime(mut self, lifetime: chrono::Duration) -> Self {
        self.link_lifetime = lifetime;
        self
    }

    /// Retrieves a live link by its short code.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] if the code is malformed
    /// - [`AppError::NotFound`] if no link matches or it has expired
    pub async fn get_by_code(&self, code: &str) -> Result<Link, AppError> {
        with_deadline(self.timeout, "link.get", async {
            validate_code(code)?;
            self.find_live(code, Utc::now()).await
        })
        .await
    }

    /// Creates a short link.
    ///
    /// The owner is the caller's subject, or none for anonymous callers.
    ///
    /// # Code selection
    ///
    /// - a `custom_code` is validated and must be unused
    /// - otherwise a random code is generated, retrying up to
    ///   [`MAX_CODE_ATTEMPTS`] times on collision
    ///
    /// A code held only by an expired link counts as unused: that link is
    /// removed and the code reissued.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for a bad URL, code or expiry in the past
    /// - [`AppError::Conflict`] if the custom code is taken, including when
    ///   another request claims it between the check and the insert
    /// - [`AppError::Internal`] when code generation is exhausted
    pub async fn create_short_link(
        &self,
        long_url: String,
        custom_code: Option<String>,
        expires_at: Option<DateTime<Utc>>,
        owner: Option<&Claims>,
    ) -> Result<Link, AppError> {
        with_deadline(self.timeout, "link.create", async {
            let now = Utc::now();
            let long_url = normalize_url(&long_url)?;
            let expires_at = match expires_at {
                Some(at) => ensure_future(at, now)?,
                None => now + self.link_lifetime,
            };

            let code = match custom_code {
                Some(custom) => {
                    validate_custom_code(&custom)?;
                    if !self.claim_code(&custom, now).await? {
                        return Err(AppError::conflict(
                            "Short code is already taken",
                            json!({ "code": custom }),
                        ));
                    }
                    custom
                }
                None => self.generate_unique_code(now).await?,
            };

            let new_link = NewLink {
                code,
                long_url,
                owner_id: owner.map(|claims| claims.subject().to_string()),
                expires_at,
            };

            let link = self.link_repository.create(new_link).await?;
            tracing::info!(code = %link.code, owner = link.owner(), "Short link created");
            Ok(link)
        })
        .await
    }

    /// Applies `patch` to the link with `code` on behalf of `claims`.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for a malformed code, empty patch, bad URL or past expiry
    /// - [`AppError::NotFound`] if the link does not exist
    /// - [`AppError::Forbidden`] unless the caller owns the link or is an admin
    /// - [`AppError::NoAffected`] if the store updated nothing
    ///
    /// Expired links can still be updated, so their expiry can be extended.
    pub async fn update_link(
        &self,
        code: &str,
        patch: LinkPatch,
        claims: &Claims,
    ) -> Result<Link, AppError> {
        with_deadline(self.timeout, "link.update", async {
            validate_code(code)?;
            if patch.is_empty() {
                return Err(AppError::bad_request(
                    "Nothing to update",
                    json!({ "fields": ["long_url", "expires_at"] }),
                ));
            }

            let now = Utc::now();
            let mut link = self.find(code).await?;
            ensure_authorized(claims, link.owner(), "link")?;

            let patch = LinkPatch {
                long_url: patch.long_url.as_deref().map(normalize_url).transpose()?,
                expires_at: patch.expires_at.map(|at| ensure_future(at, now)).transpose()?,
            };
            patch.apply(&mut link, now);

            if !self.link_repository.update(&link).await? {
                return Err(AppError::no_affected(
                    "Link was not updated",
                    json!({ "code": code }),
                ));
            }

            tracing::info!(code, subject = claims.subject(), "Short link updated");
            Ok(link)
        })
        .await
    }

    /// Deletes the link with `code` on behalf of `claims`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::update_link`], minus the patch checks. Expired links
    /// can be deleted too.
    pub async fn delete_link(&self, code: &str, claims: &Claims) -> Result<(), AppError> {
        with_deadline(self.timeout, "link.delete", async {
            validate_code(code)?;
            let link = self.find(code).await?;
            ensure_authorized(claims, link.owner(), "link")?;

            if !self.link_repository.delete(code).await? {
                return Err(AppError::no_affected(
                    "Link was not deleted",
                    json!({ "code": code }),
                ));
            }

            tracing::info!(code, subject = claims.subject(), "Short link deleted");
            Ok(())
        })
        .await
    }

    async fn find(&self, code: &str) -> Result<Link, AppError> {
        self.link_repository
            .find_by_code(code)
            .await?
            .ok_or_else(|| not_found(code))
    }

    async fn find_live(&self, code: &str, now: DateTime<Utc>) -> Result<Link, AppError> {
        let link = self.find(code).await?;
        if link.is_expired_at(now) {
            return Err(not_found(code));
        }
        Ok(link)
    }

    /// Returns true if `code` is free for a new link.
    ///
    /// An expired link holding the code is removed first.
    async fn claim_code(&self, code: &str, now: DateTime<Utc>) -> Result<bool, AppError> {
        match self.link_repository.find_by_code(code).await? {
            None => Ok(true),
            Some(link) if link.is_expired_at(now) => {
                let reclaimed = self.link_repository.delete_expired(code, now).await?;
                if reclaimed {
                    tracing::info!(code, "Expired short link reclaimed");
                }
                Ok(reclaimed)
            }
            Some(_) => Ok(false),
        }
    }

    /// Generates a code no live link uses yet.
    ///
    /// Gives up after [`MAX_CODE_ATTEMPTS`] collisions.
    async fn generate_unique_code(&self, now: DateTime<Utc>) -> Result<String, AppError> {
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = generate_code()?;

            if self.claim_code(&code, now).await? {
                return Ok(code);
            }

            counter!("short_code_collisions_total").increment(1);
            tracing::debug!(attempt, "Generated short code collided");
        }

        tracing::error!(attempts = MAX_CODE_ATTEMPTS, "Short code generation exhausted");
        Err(AppError::internal(
            "Failed to generate unique code",
            json!({ "reason": "Too many collisions" }),
        ))
    }
}

fn not_found(code: &str) -> AppError {
    AppError::not_found("Short link not found", json!({ "code": code }))
}

fn ensure_future(at: DateTime<Utc>, now: DateTime<Utc>) -> Result<DateTime<Utc>, AppError> {
    if at <= now {
        return Err(AppError::bad_request(
            "Expiration must be in the future",
            json!({ "expires_at": at }),
        ));
    }
    Ok(at)
}
