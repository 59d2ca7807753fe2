use crate::codec::{self, Decoded};
use crate::config::Config;
use crate::entry::{Entry, EntrySummary};
use crate::error::StoreError;
use crate::keys::{KeyManager, SymmetricKey};
use crate::storage::Storage;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info, warn};

/// Where a store currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    /// The data directory does not exist yet.
    Unready,
    /// No blob on disk.
    Empty,
    /// A blob that decodes with the current key.
    Populated,
    /// A blob exists but cannot be decoded; only `reset_all` recovers.
    Unreadable,
}

/// What `add` did with the new entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Added {
    New,
    Replaced,
}

/// CRUD over the encrypted credential collection.
///
/// Every mutation decodes the whole blob, changes it in memory, re-encodes
/// it and atomically replaces the file. Nothing else writes the blob.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    keys: KeyManager,
    blob: Storage,
}

impl CredentialStore {
    /// Binds a store to the configured paths. Performs no I/O.
    pub fn open(config: &Config) -> Self {
        Self {
            keys: KeyManager::new(
                config.data_dir().to_path_buf(),
                config.key_path().to_path_buf(),
            ),
            blob: Storage::new(config.blob_path().to_path_buf()),
        }
    }

    pub fn keys(&self) -> &KeyManager {
        &self.keys
    }

    pub fn blob_path(&self) -> &Path {
        self.blob.path()
    }

    pub fn ensure_storage_ready(&self) -> Result<(), StoreError> {
        self.keys.ensure_storage_ready()
    }

    pub fn load_or_create_key(&self) -> Result<SymmetricKey, StoreError> {
        self.keys.load_or_create_key()
    }

    /// Labels and usernames in stored order; secrets are never included.
    pub fn list(&self) -> Result<Vec<EntrySummary>, StoreError> {
        let key = self.keys.load_or_create_key()?;
        Ok(self.load(&key)?.iter().map(Entry::summary).collect())
    }

    /// The full entry at a 0-based position of [`list`](Self::list).
    pub fn reveal(&self, index: usize) -> Result<Entry, StoreError> {
        let key = self.keys.load_or_create_key()?;
        let mut entries = self.load(&key)?;
        check_index(index, entries.len())?;
        Ok(entries.remove(index))
    }

    pub fn find(&self, label: &str) -> Result<Option<Entry>, StoreError> {
        let key = self.keys.load_or_create_key()?;
        let mut entries = self.load(&key)?;
        let position = entries.iter().position(|e| e.has_label(label));
        Ok(position.map(|i| entries.remove(i)))
    }

    /// Appends `entry`, which always lands at the end of the listing.
    ///
    /// A case-insensitive label clash is refused with
    /// [`StoreError::DuplicateLabel`] unless `overwrite` is set, in which
    /// case the old entry is dropped first. Field validation happens when
    /// the [`Entry`] is built.
    pub fn add(&self, entry: Entry, overwrite: bool) -> Result<Added, StoreError> {
        let key = self.keys.load_or_create_key()?;
        let mut entries = self.load(&key)?;

        let outcome = if entries.iter().any(|e| e.has_label(entry.label())) {
            if !overwrite {
                return Err(StoreError::DuplicateLabel(entry.label().to_string()));
            }
            entries.retain(|e| !e.has_label(entry.label()));
            Added::Replaced
        } else {
            Added::New
        };

        debug!(label = entry.label(), ?outcome, "adding entry");
        entries.push(entry);
        self.persist(&entries, &key)?;
        Ok(outcome)
    }

    /// Removes and returns the entry at a 0-based position.
    pub fn delete(&self, index: usize) -> Result<Entry, StoreError> {
        let key = self.keys.load_or_create_key()?;
        let mut entries = self.load(&key)?;
        check_index(index, entries.len())?;

        let removed = entries.remove(index);
        self.persist(&entries, &key)?;
        debug!(label = removed.label(), "deleted entry");
        Ok(removed)
    }

    /// Drops the blob. The key is kept.
    pub fn delete_all(&self) -> Result<(), StoreError> {
        if self.blob.remove()? {
            info!(path = %self.blob.path().display(), "all credentials deleted");
        }
        Ok(())
    }

    /// Drops the blob and the key; the next access generates a new key.
    ///
    /// Both deletions are always attempted. If either fails, the first
    /// error is returned after the other has been tried.
    pub fn reset_all(&self) -> Result<(), StoreError> {
        let blob = self.blob.remove();
        let key = self.keys.reset_key();

        blob?;
        key?;
        info!("credential store reset");
        Ok(())
    }

    /// Inspects the artifacts without creating anything.
    pub fn state(&self) -> Result<StoreState, StoreError> {
        if !self.keys.data_dir().try_exists()? {
            return Ok(StoreState::Unready);
        }
        if !self.blob.exists()? {
            return Ok(StoreState::Empty);
        }
        if !self.keys.has_key()? {
            return Ok(StoreState::Unreadable);
        }

        let key = match self.keys.load_or_create_key() {
            Ok(key) => key,
            Err(StoreError::Unavailable) => return Ok(StoreState::Unreadable),
            Err(e) => return Err(e),
        };

        Ok(match codec::decode(&self.blob.load()?, &key) {
            Decoded::Collection(entries) if entries.is_empty() => StoreState::Empty,
            Decoded::Collection(_) => StoreState::Populated,
            Decoded::Corrupt => StoreState::Unreadable,
        })
    }

    fn load(&self, key: &SymmetricKey) -> Result<Vec<Entry>, StoreError> {
        let blob = match self.blob.load() {
            Ok(blob) => blob,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        match codec::decode(&blob, key) {
            Decoded::Collection(entries) => Ok(entries),
            Decoded::Corrupt => {
                warn!(path = %self.blob.path().display(), "credential blob cannot be decoded");
                Err(StoreError::Unavailable)
            }
        }
    }

    /// An empty collection is stored as "no blob", never as an empty blob.
    fn persist(&self, entries: &[Entry], key: &SymmetricKey) -> Result<(), StoreError> {
        if entries.is_empty() {
            self.blob.remove()?;
            debug!("collection empty; blob removed");
            return Ok(());
        }

        let blob = codec::encode(entries, key)?;
        self.blob.save(&blob)?;
        debug!(entries = entries.len(), bytes = blob.len(), "credential blob written");
        Ok(())
    }
}

fn check_index(index: usize, len: usize) -> Result<(), StoreError> {
    if index < len {
        Ok(())
    } else {
        Err(StoreError::IndexOutOfRange { index, len })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    fn store() -> (TempDir, CredentialStore) {
        let dir = tempdir().unwrap();
        let store = CredentialStore::open(&Config::new(dir.path().join("data")));
        (dir, store)
    }

    fn entry(label: &str, username: &str, secret: &str) -> Entry {
        Entry::new(label, username, secret).unwrap()
    }

    fn labels(store: &CredentialStore) -> Vec<String> {
        store.list().unwrap().into_iter().map(|s| s.label).collect()
    }

    #[test]
    fn list_without_blob_is_empty() {
        let (_dir, store) = store();
        assert!(store.list().unwrap().is_empty());
        assert!(!store.blob_path().exists());
    }

    #[test]
    fn add_then_list_shows_entry_without_secret() {
        let (_dir, store) = store();

        let outcome = store
            .add(entry("Gmail", "a@b.com", "P@ss1234"), false)
            .unwrap();

        assert_eq!(outcome, Added::New);
        assert_eq!(
            store.list().unwrap(),
            vec![EntrySummary {
                label: "Gmail".to_string(),
                username: "a@b.com".to_string(),
            }]
        );
    }

    #[test]
    fn duplicate_without_overwrite_is_refused() {
        let (_dir, store) = store();
        store.add(entry("Gmail", "a@b.com", "P@ss1234"), false).unwrap();

        match store.add(entry("gmail", "other", "changed"), false) {
            Err(StoreError::DuplicateLabel(label)) => assert_eq!(label, "gmail"),
            other => panic!("expected DuplicateLabel, got: {other:?}"),
        }

        let kept = store.reveal(0).unwrap();
        assert_eq!(store.list().unwrap().len(), 1);
        assert_eq!(kept.username(), "a@b.com");
        assert_eq!(kept.secret(), "P@ss1234");
    }

    #[test]
    fn duplicate_with_overwrite_replaces_and_moves_to_end() {
        let (_dir, store) = store();
        store.add(entry("Gmail", "a@b.com", "P@ss1234"), false).unwrap();
        store.add(entry("GitHub", "octocat", "hunter2"), false).unwrap();

        let outcome = store.add(entry("GMAIL", "new@b.com", "n3w"), true).unwrap();

        assert_eq!(outcome, Added::Replaced);
        assert_eq!(labels(&store), vec!["GitHub", "GMAIL"]);
        let replaced = store.reveal(1).unwrap();
        assert_eq!(replaced.username(), "new@b.com");
        assert_eq!(replaced.secret(), "n3w");
    }

    #[test]
    fn overwrite_flag_without_clash_just_appends() {
        let (_dir, store) = store();
        assert_eq!(store.add(entry("A", "u", "s"), true).unwrap(), Added::New);
        assert_eq!(labels(&store), vec!["A"]);
    }

    #[test]
    fn insertion_order_is_preserved() {
        let (_dir, store) = store();
        for label in ["c", "a", "b"] {
            store.add(entry(label, "u", "s"), false).unwrap();
        }
        assert_eq!(labels(&store), vec!["c", "a", "b"]);
    }

    #[test]
    fn reveal_returns_secret() {
        let (_dir, store) = store();
        store.add(entry("Gmail", "a@b.com", "P@ss1234"), false).unwrap();

        let revealed = store.reveal(0).unwrap();
        assert_eq!(revealed.label(), "Gmail");
        assert_eq!(revealed.secret(), "P@ss1234");
    }

    #[test]
    fn reveal_out_of_range_fails() {
        let (_dir, store) = store();
        store.add(entry("A", "u", "s"), false).unwrap();
        store.add(entry("B", "u", "s"), false).unwrap();

        match store.reveal(5) {
            Err(StoreError::IndexOutOfRange { index, len }) => {
                assert_eq!((index, len), (5, 2));
            }
            other => panic!("expected IndexOutOfRange, got: {other:?}"),
        }
    }

    #[test]
    fn find_ignores_case() {
        let (_dir, store) = store();
        store.add(entry("GitHub", "octocat", "hunter2"), false).unwrap();

        assert_eq!(store.find("github").unwrap().unwrap().secret(), "hunter2");
        assert!(store.find("gitlab").unwrap().is_none());
    }

    #[test]
    fn delete_removes_entry() {
        let (_dir, store) = store();
        store.add(entry("A", "u", "s"), false).unwrap();
        store.add(entry("B", "u", "s"), false).unwrap();

        let removed = store.delete(0).unwrap();

        assert_eq!(removed.label(), "A");
        assert_eq!(labels(&store), vec!["B"]);
    }

    #[test]
    fn delete_out_of_range_leaves_store_untouched() {
        let (_dir, store) = store();
        store.add(entry("A", "u", "s"), false).unwrap();
        let before = fs::read(store.blob_path()).unwrap();

        assert!(matches!(
            store.delete(1),
            Err(StoreError::IndexOutOfRange { index: 1, len: 1 })
        ));
        assert_eq!(fs::read(store.blob_path()).unwrap(), before);
    }

    #[test]
    fn deleting_last_entry_removes_blob() {
        let (_dir, store) = store();
        store.add(entry("A", "u", "s"), false).unwrap();

        store.delete(0).unwrap();

        assert!(!store.blob_path().exists());
        assert_eq!(store.state().unwrap(), StoreState::Empty);
    }

    #[test]
    fn delete_all_empties_store_and_keeps_key() {
        let (_dir, store) = store();
        store.add(entry("A", "u", "s"), false).unwrap();
        let key = store.load_or_create_key().unwrap();

        store.delete_all().unwrap();

        assert!(store.list().unwrap().is_empty());
        assert!(!store.blob_path().exists());
        assert_eq!(store.load_or_create_key().unwrap(), key);
    }

    #[test]
    fn delete_all_without_blob_is_ok() {
        let (_dir, store) = store();
        store.delete_all().unwrap();
    }

    #[test]
    fn reset_all_changes_key_identity() {
        let (_dir, store) = store();
        store.add(entry("A", "u", "s"), false).unwrap();
        let before = store.load_or_create_key().unwrap();

        store.reset_all().unwrap();

        assert!(!store.blob_path().exists());
        assert!(!store.keys().key_path().exists());
        assert_ne!(store.load_or_create_key().unwrap(), before);
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn reset_all_tolerates_missing_artifacts() {
        let (_dir, store) = store();
        store.reset_all().unwrap();
        store.reset_all().unwrap();
    }

    #[test]
    fn lost_key_makes_store_unavailable_until_reset() {
        let (_dir, store) = store();
        store.add(entry("A", "u", "s"), false).unwrap();

        store.keys().reset_key().unwrap();

        assert_eq!(store.state().unwrap(), StoreState::Unreadable);
        assert!(matches!(store.list(), Err(StoreError::Unavailable)));
        assert!(matches!(store.reveal(0), Err(StoreError::Unavailable)));
        assert!(matches!(
            store.add(entry("B", "u", "s"), false),
            Err(StoreError::Unavailable)
        ));
        assert!(matches!(store.delete(0), Err(StoreError::Unavailable)));

        store.reset_all().unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn tampered_blob_is_unavailable_and_not_overwritten() {
        let (_dir, store) = store();
        store.add(entry("A", "u", "s"), false).unwrap();

        let mut blob = fs::read(store.blob_path()).unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0x01;
        fs::write(store.blob_path(), &blob).unwrap();

        assert!(matches!(store.list(), Err(StoreError::Unavailable)));
        assert!(store.add(entry("B", "u", "s"), false).is_err());
        assert_eq!(fs::read(store.blob_path()).unwrap(), blob);
    }

    #[test]
    fn state_follows_lifecycle() {
        let (_dir, store) = store();
        assert_eq!(store.state().unwrap(), StoreState::Unready);

        store.ensure_storage_ready().unwrap();
        assert_eq!(store.state().unwrap(), StoreState::Empty);

        store.add(entry("A", "u", "s"), false).unwrap();
        assert_eq!(store.state().unwrap(), StoreState::Populated);

        store.delete_all().unwrap();
        assert_eq!(store.state().unwrap(), StoreState::Empty);
    }

    #[test]
    fn state_does_not_create_key() {
        let (_dir, store) = store();
        store.ensure_storage_ready().unwrap();

        store.state().unwrap();

        assert!(!store.keys().key_path().exists());
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempdir().unwrap();
        let config = Config::new(dir.path().join("data"));

        CredentialStore::open(&config)
            .add(entry("Gmail", "a@b.com", "P@ss1234"), false)
            .unwrap();

        let reopened = CredentialStore::open(&config);
        assert_eq!(reopened.reveal(0).unwrap().secret(), "P@ss1234");
    }

    #[test]
    fn secrets_are_not_stored_in_plaintext() {
        let (_dir, store) = store();
        store.add(entry("Gmail", "a@b.com", "P@ss1234"), false).unwrap();

        let raw = fs::read(store.blob_path()).unwrap();
        let needle = b"P@ss1234";
        assert!(!raw.windows(needle.len()).any(|w| w == needle));
    }
}
