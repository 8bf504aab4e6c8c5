//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating repository calls,
//! validation, and the access policy. Services consume repository traits and
//! provide a clean API for HTTP handlers and the admin CLI.
//!
//! # Available Services
//!
//! - [`services::authenticator::Authenticator`] - Signed identity tokens with key rotation
//! - [`services::link_service::LinkService`] - Short link creation, lookup and mutation
//! - [`services::user_service::UserService`] - Accounts and credential checks

pub mod services;
