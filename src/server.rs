//! HTTP server initialization and runtime setup.
//!
//! Handles the store selection, key loading, and Axum server lifecycle.

use crate::application::services::{Authenticator, LinkService, UserService};
use crate::config::Config;
use crate::domain::repositories::{LinkRepository, UserRepository};
use crate::infrastructure::keys::{KeyRing, parse_algorithm, read_encoding_key};
use crate::infrastructure::persistence::{
    MemoryLinkRepository, MemoryUserRepository, PgLinkRepository, PgUserRepository,
};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Opens the PostgreSQL pool with the configured limits.
pub async fn connect_pool(config: &Config, database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;

    Ok(pool)
}

/// Loads the active signing key and every published verification key.
///
/// # Errors
///
/// Fails when a key file is unreadable or the active kid has no published
/// public key, since every issued token would then be rejected.
pub async fn build_authenticator(config: &Config) -> Result<Authenticator> {
    let algorithm = parse_algorithm(&config.jwt_algorithm)?;

    let encoding_key = read_encoding_key(algorithm, &config.jwt_private_key_path)
        .await
        .context("Failed to load signing key")?;

    let key_ring = KeyRing::new();
    let loaded = key_ring
        .load_dir(algorithm, &config.jwt_public_keys_dir)
        .await
        .context("Failed to load verification keys")?;

    let kids = key_ring.kids().await;
    if !kids.iter().any(|kid| kid == &config.jwt_active_kid) {
        anyhow::bail!(
            "No public key for active kid {:?} in {}",
            config.jwt_active_kid,
            config.jwt_public_keys_dir.display()
        );
    }
    tracing::info!(count = loaded, kids = ?kids, "Verification keys loaded");

    let authenticator = Authenticator::new(
        encoding_key,
        config.jwt_active_kid.clone(),
        &config.jwt_algorithm,
        Arc::new(key_ring),
    )?;

    Ok(authenticator)
}

/// Builds the shared state on top of the given repositories.
pub fn build_state(
    config: &Config,
    link_repository: Arc<dyn LinkRepository>,
    user_repository: Arc<dyn UserRepository>,
    authenticator: Arc<Authenticator>,
) -> AppState {
    let link_service = LinkService::new(link_repository)
        .with_timeout(config.request_timeout())
        .with_link_lifetime(config.link_lifetime());

    let user_service = UserService::new(user_repository)
        .with_timeout(config.request_timeout())
        .with_token_ttl(config.token_ttl())
        .with_bcrypt_cost(config.bcrypt_cost);

    AppState::new(link_service, user_service, authenticator, &config.base_url)
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool and migrations, or the in-memory store
/// - Signing key and verification key ring
/// - Axum HTTP server with graceful shutdown on Ctrl+C
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Key material can't be loaded
/// - Server bind fails
pub async fn run(config: Config) -> Result<()> {
    let authenticator = Arc::new(build_authenticator(&config).await?);

    let state = match &config.database_url {
        Some(database_url) => {
            let pool = connect_pool(&config, database_url).await?;
            tracing::info!("Connected to database");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to migrate")?;

            let pool = Arc::new(pool);
            build_state(
                &config,
                Arc::new(PgLinkRepository::new(pool.clone())),
                Arc::new(PgUserRepository::new(pool.clone())),
                authenticator,
            )
            .with_db(pool)
        }
        None => {
            tracing::warn!("No database configured, using the in-memory store");
            build_state(
                &config,
                Arc::new(MemoryLinkRepository::new()),
                Arc::new(MemoryUserRepository::new()),
                authenticator,
            )
        }
    };

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
