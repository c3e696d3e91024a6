use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::error::StorageError;
use crate::preferences::PreferenceStorage;

pub const PREFERENCES_FILE_NAME: &str = "preferences.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedPreferences {
    pub version: u8,
    pub values: BTreeMap<String, String>,
}

/// Preference slots kept as one JSON document on disk.
#[derive(Debug)]
pub struct FilePreferenceStorage {
    path: PathBuf,
    cached: PersistedPreferences,
}

impl FilePreferenceStorage {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|source| StorageError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = dir.join(PREFERENCES_FILE_NAME);
        let cached = match load_preferences(path.as_path()) {
            Ok(cached) => cached,
            Err(err @ StorageError::Decode { .. }) => {
                tracing::warn!(error = %err, "unreadable preferences replaced on next save");
                empty_preferences()
            }
            Err(err) => return Err(err),
        };
        Ok(Self { path, cached })
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    fn save(&self) -> Result<(), StorageError> {
        let encoded = serde_json::to_vec_pretty(&self.cached).map_err(StorageError::Encode)?;
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, encoded).map_err(|source| StorageError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        std::fs::rename(&tmp_path, &self.path).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl PreferenceStorage for FilePreferenceStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.cached.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let previous = self
            .cached
            .values
            .insert(key.to_string(), value.to_string());
        if let Err(err) = self.save() {
            match previous {
                Some(previous) => self.cached.values.insert(key.to_string(), previous),
                None => self.cached.values.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }
}

fn empty_preferences() -> PersistedPreferences {
    PersistedPreferences {
        version: 1,
        values: BTreeMap::new(),
    }
}

fn load_preferences(path: &Path) -> Result<PersistedPreferences, StorageError> {
    if !path.exists() {
        return Ok(empty_preferences());
    }
    let bytes = std::fs::read(path).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice::<PersistedPreferences>(&bytes).map_err(|source| StorageError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::preferences::FlagSurface;
    use crate::preferences::PreferenceStore;
    use crate::preferences::ThemeMode;
    use crate::preferences::THEME_STORAGE_KEY;

    #[test]
    fn missing_file_reads_as_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = FilePreferenceStorage::open(dir.path().join("nested")).expect("open");
        assert_eq!(storage.get(THEME_STORAGE_KEY).expect("get"), None);
        assert!(!storage.path().exists());
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut storage = FilePreferenceStorage::open(dir.path()).expect("open");
        storage.set(THEME_STORAGE_KEY, "dark").expect("set");

        let reopened = FilePreferenceStorage::open(dir.path()).expect("reopen");
        assert_eq!(
            reopened.get(THEME_STORAGE_KEY).expect("get"),
            Some("dark".to_string())
        );
        assert!(!dir.path().join("preferences.json.tmp").exists());
    }

    #[test]
    fn corrupt_file_is_decoded_as_error_but_open_recovers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(PREFERENCES_FILE_NAME);
        std::fs::write(&path, b"{not json").expect("write");
        assert!(matches!(
            load_preferences(&path),
            Err(StorageError::Decode { .. })
        ));

        let storage = FilePreferenceStorage::open(dir.path()).expect("open corrupt");
        let mut store = PreferenceStore::initialize(storage, &true, FlagSurface::default());
        assert_eq!(store.mode(), ThemeMode::Dark);
        store.toggle().expect("toggle overwrites corrupt file");

        let reopened = FilePreferenceStorage::open(dir.path()).expect("reopen");
        assert_eq!(
            reopened.get(THEME_STORAGE_KEY).expect("get"),
            Some("light".to_string())
        );
    }

    #[test]
    fn toggled_theme_wins_over_ambient_on_next_start() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = FilePreferenceStorage::open(dir.path()).expect("open");
        let mut store = PreferenceStore::initialize(storage, &true, FlagSurface::default());
        assert_eq!(store.mode(), ThemeMode::Dark);
        store.toggle().expect("toggle");

        let storage = FilePreferenceStorage::open(dir.path()).expect("reopen");
        let store = PreferenceStore::initialize(storage, &true, FlagSurface::default());
        assert_eq!(store.mode(), ThemeMode::Light);
    }
}
