use thiserror::Error;

/// Every expected failure of the credential store.
///
/// None of these abort the process; callers decide whether to re-prompt,
/// ask for confirmation, or suggest a reset.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("credential store is unreadable (wrong key or corrupted data); a reset is required")]
    Unavailable,

    #[error("{field} must not be empty")]
    Validation { field: &'static str },

    #[error("an entry labelled '{0}' already exists")]
    DuplicateLabel(String),

    #[error("index {index} is out of range for {len} stored entries")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("encryption failed: {0}")]
    Crypto(String),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
