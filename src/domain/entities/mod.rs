//! Core domain entities.
//!
//! Entities are plain data structures. Creation inputs are separate types
//! (`NewLink`, `NewUser`) and partial updates are expressed as `LinkPatch` /
//! `UserChanges` where `None` means "leave unchanged".
//!
//! - [`Link`] - a shortened URL record
//! - [`User`] - a registered account
//! - [`Claims`] - the authenticated identity carried in a token

pub mod claims;
pub mod link;
pub mod user;

pub use claims::{Claims, Role};
pub use link::{Link, LinkPatch, NewLink};
pub use user::{NewUser, User, UserChanges};
