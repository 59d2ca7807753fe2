//! Offline password utility suite.
//!
//! The core is [`CredentialStore`]: labelled credentials kept in a single
//! XChaCha20-Poly1305 blob under a locally generated key. Alongside it live
//! small stateless helpers for generating passwords ([`generator`]),
//! scoring them ([`strength`]) and checking them against a [`policy`].

pub mod codec;
mod config;
mod crypto;
mod entry;
mod error;
pub mod generator;
mod keys;
pub mod policy;
mod storage;
mod store;
pub mod strength;

pub use crate::codec::Decoded;
pub use crate::config::{Config, default_data_dir, resolve_config};
pub use crate::entry::{Entry, EntrySummary};
pub use crate::error::StoreError;
pub use crate::keys::{KeyManager, SymmetricKey};
pub use crate::storage::Storage;
pub use crate::store::{Added, CredentialStore, StoreState};
