//! Link entity representing a shortened URL record.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A shortened URL with its owner and lifetime.
///
/// `owner_id` is `None` for links created anonymously; such links can only
/// be changed by an administrator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    pub code: String,
    pub long_url: String,
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Link {
    /// Owner id as seen by the authorization policy (empty for anonymous links).
    pub fn owner(&self) -> &str {
        self.owner_id.as_deref().unwrap_or_default()
    }

    /// Returns true if the link has passed its expiry time as of `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Input data for storing a new link.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLink {
    pub code: String,
    pub long_url: String,
    pub owner_id: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl NewLink {
    /// Materialises the record as the store keeps it.
    pub fn into_link(self, now: DateTime<Utc>) -> Link {
        Link {
            code: self.code,
            long_url: self.long_url,
            owner_id: self.owner_id,
            created_at: now,
            updated_at: now,
            expires_at: self.expires_at,
        }
    }
}

/// Partial update for an existing link.
///
/// `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkPatch {
    pub long_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl LinkPatch {
    pub fn is_empty(&self) -> bool {
        self.long_url.is_none() && self.expires_at.is_none()
    }

    /// Applies present fields to `link` and bumps `updated_at`.
    pub fn apply(self, link: &mut Link, now: DateTime<Utc>) {
        if let Some(long_url) = self.long_url {
            link.long_url = long_url;
        }
        if let Some(expires_at) = self.expires_at {
            link.expires_at = expires_at;
        }
        link.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(owner: Option<&str>) -> Link {
        let now = Utc::now();
        NewLink {
            code: "abc123".to_string(),
            long_url: "https://example.com".to_string(),
            owner_id: owner.map(str::to_string),
            expires_at: now + Duration::days(1),
        }
        .into_link(now)
    }

    #[test]
    fn test_link_creation() {
        let link = sample(Some("u1"));

        assert_eq!(link.code, "abc123");
        assert_eq!(link.owner(), "u1");
        assert_eq!(link.created_at, link.updated_at);
        assert!(!link.is_expired_at(Utc::now()));
    }

    #[test]
    fn test_anonymous_owner_is_empty() {
        assert_eq!(sample(None).owner(), "");
    }

    #[test]
    fn test_link_is_expired_at_boundary() {
        let link = sample(None);
        assert!(!link.is_expired_at(link.expires_at - Duration::seconds(1)));
        assert!(link.is_expired_at(link.expires_at));
    }

    #[test]
    fn test_patch_merges_only_present_fields() {
        let mut link = sample(Some("u1"));
        let original_expiry = link.expires_at;
        let later = Utc::now() + Duration::seconds(5);

        LinkPatch {
            long_url: Some("https://rust-lang.org".to_string()),
            expires_at: None,
        }
        .apply(&mut link, later);

        assert_eq!(link.long_url, "https://rust-lang.org");
        assert_eq!(link.expires_at, original_expiry);
        assert_eq!(link.updated_at, later);
    }
}
