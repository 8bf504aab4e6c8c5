//! Shared application state injected into every handler.

use sqlx::PgPool;
use std::sync::Arc;

use crate::application::services::{Authenticator, LinkService, UserService};
use crate::domain::repositories::{LinkRepository, UserRepository};

/// Services and settings shared by all requests. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService<dyn LinkRepository>>,
    pub user_service: Arc<UserService<dyn UserRepository>>,
    pub authenticator: Arc<Authenticator>,
    /// Prefix of every `short_url`, without a trailing slash.
    pub base_url: Arc<str>,
    /// Present when the repositories are backed by PostgreSQL.
    pub db: Option<Arc<PgPool>>,
}

impl AppState {
    pub fn new(
        link_service: LinkService<dyn LinkRepository>,
        user_service: UserService<dyn UserRepository>,
        authenticator: Arc<Authenticator>,
        base_url: &str,
    ) -> Self {
        Self {
            link_service: Arc::new(link_service),
            user_service: Arc::new(user_service),
            authenticator,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            db: None,
        }
    }

    pub fn with_db(mut self, pool: Arc<PgPool>) -> Self {
        self.db = Some(pool);
        self
    }

    /// Public URL that redirects to the link `code`.
    pub fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.base_url, code)
    }
}
