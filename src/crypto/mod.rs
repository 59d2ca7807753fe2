//! Cryptographic primitives for the credential blob.
//!
//! Provides key generation, authenticated encryption, and blob header handling.

pub mod aead;
pub mod header;

pub use aead::{decrypt, encrypt, generate_key};
pub use header::Header;

/// Length of the nonce (24 bytes for XChaCha20-Poly1305).
pub const NONCE_LEN: usize = 24;
/// Length of the symmetric key (32 bytes / 256 bits).
pub const KEY_LEN: usize = 32;
/// Length of the magic bytes (4 bytes "PWOB").
pub const MAGIC_LEN: usize = 4;
/// Length of the version field (1 byte).
pub const VER_LEN: usize = 1;
