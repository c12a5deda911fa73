//! Named archive roots: stable identifiers mapped to resolved directories.
//!
//! Stands in for platform bookmark storage; the value side is the resolved
//! location handle the catalog builder walks.

use crate::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Default, Serialize, Deserialize)]
struct RootFile {
    #[serde(default)]
    roots: BTreeMap<String, PathBuf>,
}

pub trait RootStore: Send + Sync {
    fn all_keys(&self) -> Vec<String>;
    fn root(&self, key: &str) -> Option<PathBuf>;
    fn all(&self) -> BTreeMap<String, PathBuf>;
    fn put(&self, key: &str, path: PathBuf) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Roots as a single TOML table, key to directory path.
pub struct TomlRootStore {
    path: PathBuf,
}

impl TomlRootStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read(&self) -> RootFile {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(_) => return RootFile::default(),
        };
        match toml::from_str(&data) {
            Ok(file) => file,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "unreadable roots file, treating as empty");
                RootFile::default()
            }
        }
    }

    fn write(&self, file: &RootFile) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = toml::to_string_pretty(file).map_err(|e| StoreError::Encode(e.to_string()))?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

impl RootStore for TomlRootStore {
    fn all_keys(&self) -> Vec<String> {
        self.read().roots.keys().cloned().collect()
    }

    fn root(&self, key: &str) -> Option<PathBuf> {
        self.read().roots.get(key).cloned()
    }

    fn all(&self) -> BTreeMap<String, PathBuf> {
        self.read().roots
    }

    fn put(&self, key: &str, path: PathBuf) -> Result<(), StoreError> {
        let mut file = self.read();
        file.roots.insert(key.to_string(), path);
        self.write(&file)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut file = self.read();
        file.roots.remove(key);
        self.write(&file)
    }
}
