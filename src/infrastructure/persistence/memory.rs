//! In-process repositories.
//!
//! Used when no database is configured and by the HTTP tests. They enforce the
//! same uniqueness rules as the PostgreSQL schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::{Link, NewLink, NewUser, User};
use crate::domain::repositories::{LinkRepository, UserRepository};
use crate::error::AppError;

/// Links keyed by code.
#[derive(Default)]
pub struct MemoryLinkRepository {
    links: RwLock<HashMap<String, Link>>,
}

impl MemoryLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LinkRepository for MemoryLinkRepository {
    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        Ok(self.links.read().await.get(code).cloned())
    }

    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        let mut links = self.links.write().await;
        if links.contains_key(&new_link.code) {
            return Err(AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": "links_pkey" }),
            ));
        }

        let link = new_link.into_link(Utc::now());
        links.insert(link.code.clone(), link.clone());
        Ok(link)
    }

    async fn update(&self, link: &Link) -> Result<bool, AppError> {
        match self.links.write().await.get_mut(&link.code) {
            Some(stored) => {
                stored.long_url = link.long_url.clone();
                stored.expires_at = link.expires_at;
                stored.updated_at = link.updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, code: &str) -> Result<bool, AppError> {
        Ok(self.links.write().await.remove(code).is_some())
    }

    async fn delete_expired(&self, code: &str, now: DateTime<Utc>) -> Result<bool, AppError> {
        let mut links = self.links.write().await;
        match links.get(code) {
            Some(link) if link.is_expired_at(now) => {
                links.remove(code);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Users keyed by id, with unique emails.
#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_conflict() -> AppError {
    AppError::conflict(
        "Unique constraint violation",
        json!({ "constraint": "users_email_key" }),
    )
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if users.values().any(|user| user.email == new_user.email) {
            return Err(email_conflict());
        }
        if users.contains_key(&new_user.id) {
            return Err(AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": "users_pkey" }),
            ));
        }

        let user = new_user.into_user(Utc::now());
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<bool, AppError> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|other| other.id != user.id && other.email == user.email)
        {
            return Err(email_conflict());
        }

        match users.get_mut(&user.id) {
            Some(stored) => {
                *stored = User {
                    created_at: stored.created_at,
                    ..user.clone()
                };
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.users.write().await.remove(&id).is_some())
    }
}
