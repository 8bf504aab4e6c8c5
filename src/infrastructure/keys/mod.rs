//! Token key material and [`KeyLookup`](crate::domain::repositories::KeyLookup)
//! implementations.
//!
//! - [`StaticKeyLookup`] - one fixed kid
//! - [`KeyRing`] - published kids with rotation
//! - [`pem`] - PEM parsing per algorithm family and Ed25519 key generation

pub mod key_ring;
pub mod pem;
pub mod static_lookup;

pub use key_ring::KeyRing;
pub use pem::{
    GeneratedKeyPair, PUBLIC_KEY_SUFFIX, decoding_key_from_pem, encoding_key_from_pem,
    generate_ed25519_keypair, parse_algorithm, read_encoding_key,
};
pub use static_lookup::StaticKeyLookup;
