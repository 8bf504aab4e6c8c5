//! Repository implementations.
//!
//! PostgreSQL repositories use runtime-checked SQLx queries against the schema
//! in `migrations/`. The in-memory repositories back local runs without a
//! database and the HTTP tests.
//!
//! # Repositories
//!
//! - [`PgLinkRepository`] / [`MemoryLinkRepository`] - short links
//! - [`PgUserRepository`] / [`MemoryUserRepository`] - user accounts

pub mod memory;
pub mod pg_link_repository;
pub mod pg_user_repository;

pub use memory::{MemoryLinkRepository, MemoryUserRepository};
pub use pg_link_repository::PgLinkRepository;
pub use pg_user_repository::PgUserRepository;
