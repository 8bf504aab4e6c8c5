//! User account entity.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

use super::claims::Role;

/// A registered user.
///
/// `password_hash` holds a bcrypt hash, never the plaintext password.
#[derive(Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub roles: BTreeSet<Role>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("roles", &self.roles)
            .field("password_hash", &"***")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Input data for storing a new user.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub roles: BTreeSet<Role>,
    pub password_hash: String,
}

impl NewUser {
    pub fn into_user(self, now: DateTime<Utc>) -> User {
        User {
            id: self.id,
            email: self.email,
            full_name: self.full_name,
            roles: self.roles,
            password_hash: self.password_hash,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Requested changes to a user account.
///
/// `None` fields are left unchanged. Changing the password requires
/// `current_password`.
#[derive(Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

impl fmt::Debug for UserChanges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserChanges")
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("current_password", &self.current_password.as_ref().map(|_| "***"))
            .field("new_password", &self.new_password.as_ref().map(|_| "***"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secrets() {
        let user = NewUser {
            id: Uuid::new_v4(),
            email: "a@example.com".to_string(),
            full_name: "Alice".to_string(),
            roles: BTreeSet::from([Role::User]),
            password_hash: "$2b$04$secret".to_string(),
        }
        .into_user(Utc::now());

        let rendered = format!("{user:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("a@example.com"));

        let changes = UserChanges {
            current_password: Some("hunter22".to_string()),
            ..Default::default()
        };
        assert!(!format!("{changes:?}").contains("hunter22"));
    }
}
