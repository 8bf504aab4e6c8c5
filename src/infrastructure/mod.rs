//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer.
//!
//! # Modules
//!
//! - [`keys`] - Token key material and key lookups
//! - [`persistence`] - PostgreSQL and in-memory repositories

pub mod keys;
pub mod persistence;
