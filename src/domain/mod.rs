//! Domain layer: entities, the authorization policy, and repository contracts.
//!
//! # Architecture
//!
//! - [`entities`] - core data structures (links, users, claims)
//! - [`policy`] - the owner-or-admin rule applied before every mutation
//! - [`repositories`] - store and key lookup trait definitions
//!
//! The domain layer has no dependency on infrastructure or presentation.
//! Business orchestration lives in [`crate::application::services`].

pub mod entities;
pub mod policy;
pub mod repositories;
