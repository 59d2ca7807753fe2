use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

/// One stored credential.
///
/// Construction validates that every field is non-empty; decoding goes
/// through the same check, so a blob can never yield an invalid entry.
#[derive(Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "RawEntry")]
pub struct Entry {
    label: String,
    username: String,
    secret: String,
}

#[derive(Deserialize)]
struct RawEntry {
    label: String,
    username: String,
    secret: String,
}

/// The non-secret part of an entry, as shown in listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySummary {
    pub label: String,
    pub username: String,
}

impl Entry {
    pub fn new(
        label: impl Into<String>,
        username: impl Into<String>,
        secret: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let entry = Self {
            label: label.into(),
            username: username.into(),
            secret: secret.into(),
        };

        for (field, value) in [
            ("label", &entry.label),
            ("username", &entry.username),
            ("secret", &entry.secret),
        ] {
            if value.trim().is_empty() {
                return Err(StoreError::Validation { field });
            }
        }

        Ok(entry)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Case-insensitive label comparison; labels are the entry identity.
    pub fn has_label(&self, label: &str) -> bool {
        self.label.to_lowercase() == label.to_lowercase()
    }

    pub fn summary(&self) -> EntrySummary {
        EntrySummary {
            label: self.label.clone(),
            username: self.username.clone(),
        }
    }
}

impl TryFrom<RawEntry> for Entry {
    type Error = StoreError;

    fn try_from(raw: RawEntry) -> Result<Self, Self::Error> {
        Entry::new(raw.label, raw.username, raw.secret)
    }
}

impl Drop for Entry {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("label", &self.label)
            .field("username", &self.username)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
