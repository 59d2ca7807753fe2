use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub const DEFAULT_KEY_FILE: &str = "key.key";
pub const DEFAULT_DB_FILE: &str = "passwords.enc";

/// Locations of the store's artifacts, handed to the store at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    data_dir: PathBuf,
    key_path: PathBuf,
    blob_path: PathBuf,
}

impl Config {
    /// Key and blob live under `data_dir` with their default file names.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            key_path: data_dir.join(DEFAULT_KEY_FILE),
            blob_path: data_dir.join(DEFAULT_DB_FILE),
            data_dir,
        }
    }

    pub fn with_key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_path = path.into();
        self
    }

    pub fn with_blob_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.blob_path = path.into();
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn key_path(&self) -> &Path {
        &self.key_path
    }

    pub fn blob_path(&self) -> &Path {
        &self.blob_path
    }
}

/// Platform data directory, e.g. `~/.local/share/pwoffice` on Linux.
pub fn default_data_dir() -> Result<PathBuf> {
    let project_dirs =
        ProjectDirs::from("", "", "pwoffice").context("could not determine platform directories")?;

    Ok(project_dirs.data_dir().to_path_buf())
}

/// Builds a config from optional overrides, falling back to the platform
/// data directory.
pub fn resolve_config(
    data_dir: Option<PathBuf>,
    key_file: Option<PathBuf>,
    db_file: Option<PathBuf>,
) -> Result<Config> {
    let data_dir = match data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    let mut config = Config::new(data_dir);
    if let Some(path) = key_file {
        config = config.with_key_path(path);
    }
    if let Some(path) = db_file {
        config = config.with_blob_path(path);
    }
    Ok(config)
}
