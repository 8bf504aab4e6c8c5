//! Repository and collaborator trait definitions for the domain layer.
//!
//! Traits define the contract; implementations live in
//! `crate::infrastructure`. Mock implementations are generated with `mockall`
//! for unit tests.
//!
//! - [`LinkRepository`] - short link records
//! - [`UserRepository`] - user accounts
//! - [`KeyLookup`] - kid to verification key resolution

pub mod key_lookup;
pub mod link_repository;
pub mod user_repository;

pub use key_lookup::KeyLookup;
pub use link_repository::LinkRepository;
pub use user_repository::UserRepository;

#[cfg(test)]
pub use key_lookup::MockKeyLookup;
#[cfg(test)]
pub use link_repository::MockLinkRepository;
#[cfg(test)]
pub use user_repository::MockUserRepository;
