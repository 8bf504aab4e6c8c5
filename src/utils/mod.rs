//! Utility functions shared by services and handlers.
//!
//! - [`code_generator`] - short code generation and validation
//! - [`url_normalizer`] - target URL validation and normalization
//! - [`password`] - bcrypt hashing on the blocking pool
//! - [`deadline`] - per-operation timeouts

pub mod code_generator;
pub mod deadline;
pub mod password;
pub mod url_normalizer;
