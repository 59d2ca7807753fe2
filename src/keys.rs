//! Lifecycle of the symmetric key that protects the credential blob.

use crate::crypto::{self, KEY_LEN};
use crate::error::StoreError;
use crate::storage::Storage;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// Raw key material. Wiped from memory on drop, never printed.
#[derive(Clone)]
pub struct SymmetricKey(Zeroizing<[u8; KEY_LEN]>);

impl SymmetricKey {
    pub(crate) fn generate() -> Result<Self, StoreError> {
        crypto::generate_key()
            .map(Self)
            .map_err(|e| StoreError::Crypto(e.to_string()))
    }

    /// Rebuilds a key from its persisted bytes; `None` if the length is wrong.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let raw: [u8; KEY_LEN] = bytes.try_into().ok()?;
        Some(Self(Zeroizing::new(raw)))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl PartialEq for SymmetricKey {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for SymmetricKey {}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey([REDACTED])")
    }
}

/// Loads, creates and destroys the key artifact.
#[derive(Clone, Debug)]
pub struct KeyManager {
    data_dir: PathBuf,
    storage: Storage,
}

impl KeyManager {
    pub fn new(data_dir: PathBuf, key_path: PathBuf) -> Self {
        Self {
            data_dir,
            storage: Storage::new(key_path),
        }
    }

    /// Creates the data directory if it is missing. Idempotent.
    pub fn ensure_storage_ready(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }

    /// Returns the persisted key, generating and persisting one on first use.
    ///
    /// An existing key artifact is never overwritten: if it cannot be read
    /// the I/O error is returned, and if it has the wrong size the store is
    /// reported as [`StoreError::Unavailable`] until an explicit reset.
    pub fn load_or_create_key(&self) -> Result<SymmetricKey, StoreError> {
        self.ensure_storage_ready()?;

        if self.storage.exists()? {
            let bytes = Zeroizing::new(self.storage.load()?);
            debug!(path = %self.key_path().display(), "loaded encryption key");
            return SymmetricKey::from_bytes(&bytes).ok_or_else(|| {
                warn!(
                    path = %self.key_path().display(),
                    len = bytes.len(),
                    "key artifact has unexpected size"
                );
                StoreError::Unavailable
            });
        }

        let key = SymmetricKey::generate()?;
        self.storage.save(key.as_bytes())?;
        info!(path = %self.key_path().display(), "generated new encryption key");
        Ok(key)
    }

    /// Deletes the key artifact. Missing key is a no-op.
    pub fn reset_key(&self) -> Result<(), StoreError> {
        if self.storage.remove()? {
            warn!(
                path = %self.key_path().display(),
                "encryption key deleted; existing credential blobs are now unreadable"
            );
        } else {
            debug!("no encryption key to delete");
        }
        Ok(())
    }

    pub fn has_key(&self) -> Result<bool, StoreError> {
        Ok(self.storage.exists()?)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn key_path(&self) -> &Path {
        self.storage.path()
    }
}
