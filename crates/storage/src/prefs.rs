use crate::models::UserPreferences;
use crate::StoreError;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

/// Loads and saves the user's classification preferences.
pub trait PreferencesStore: Send + Sync {
    /// Absent or corrupt data yields the defaults, never an error.
    fn load(&self) -> UserPreferences;
    fn save(&self, prefs: &UserPreferences) -> Result<(), StoreError>;
}

/// Preferences as a single JSON file.
pub struct JsonPreferencesStore {
    path: PathBuf,
}

impl JsonPreferencesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PreferencesStore for JsonPreferencesStore {
    fn load(&self) -> UserPreferences {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(_) => return UserPreferences::default(),
        };
        match serde_json::from_str(&data) {
            Ok(prefs) => prefs,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "unreadable preferences file, using defaults");
                UserPreferences::default()
            }
        }
    }

    fn save(&self, prefs: &UserPreferences) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data =
            serde_json::to_string_pretty(prefs).map_err(|e| StoreError::Encode(e.to_string()))?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}
