//! Authenticated identity carried inside a signed token.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Role tag attached to a user and to every token issued for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role {other:?}")),
        }
    }
}

/// Identity claims of a token.
///
/// Timestamps are whole Unix seconds, so a token round-trip reproduces the
/// value exactly. `exp` is always strictly greater than `iat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: String,
    pub roles: BTreeSet<Role>,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Builds claims valid from `now` for `ttl`.
    ///
    /// Sub-second precision is dropped. A zero `ttl` is raised to one second.
    pub fn new(
        subject: impl Into<String>,
        roles: impl IntoIterator<Item = Role>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let iat = now.timestamp();
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX).max(1);

        Self {
            sub: subject.into(),
            roles: roles.into_iter().collect(),
            iat,
            exp: iat.saturating_add(ttl_secs),
        }
    }

    pub fn subject(&self) -> &str {
        &self.sub
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.iat, 0).single()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }

    /// Returns true while `now` lies in `[iat, exp)`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        let now = now.timestamp();
        self.iat <= now && now < self.exp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn test_claims_window() {
        let now = Utc::now();
        let claims = Claims::new("u1", [Role::User], now, Duration::from_secs(60));

        assert_eq!(claims.exp - claims.iat, 60);
        assert!(claims.is_valid_at(now));
        assert!(claims.is_valid_at(now + ChronoDuration::seconds(59)));
        assert!(!claims.is_valid_at(now + ChronoDuration::seconds(61)));
        assert!(!claims.is_valid_at(now - ChronoDuration::seconds(5)));
    }

    #[test]
    fn test_zero_ttl_still_expires_after_issue() {
        let claims = Claims::new("u1", [Role::User], Utc::now(), Duration::ZERO);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_roles_are_a_set() {
        let claims = Claims::new(
            "u1",
            [Role::Admin, Role::User, Role::Admin],
            Utc::now(),
            Duration::from_secs(60),
        );
        assert_eq!(claims.roles.len(), 2);
        assert!(claims.is_admin());
        assert!(claims.has_role(Role::User));
    }

    #[test]
    fn test_role_serde_tags() {
        let json = serde_json::to_string(&[Role::User, Role::Admin]).unwrap();
        assert_eq!(json, r#"["user","admin"]"#);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("root".parse::<Role>().is_err());
    }
}
