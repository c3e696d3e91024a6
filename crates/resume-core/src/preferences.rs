use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::error::StorageError;

pub const THEME_STORAGE_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeMode {
    Light,
    Dark,
}

impl ThemeMode {
    pub fn from_dark(dark: bool) -> Self {
        if dark {
            Self::Dark
        } else {
            Self::Light
        }
    }

    pub fn is_dark(self) -> bool {
        matches!(self, Self::Dark)
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }
}

/// Durable key/value slot for user preferences.
pub trait PreferenceStorage: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// The platform's color-scheme hint.
pub trait AmbientScheme {
    fn prefers_dark(&self) -> bool;
}

impl AmbientScheme for bool {
    fn prefers_dark(&self) -> bool {
        *self
    }
}

/// Document-level presentation flag that styling reacts to.
pub trait ThemeSurface: Send {
    fn apply(&mut self, mode: ThemeMode);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryPreferenceStorage {
    values: BTreeMap<String, String>,
}

impl MemoryPreferenceStorage {
    pub fn with_value(key: &str, value: &str) -> Self {
        let mut values = BTreeMap::new();
        values.insert(key.to_string(), value.to_string());
        Self { values }
    }
}

impl PreferenceStorage for MemoryPreferenceStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Surface that only remembers the last applied mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlagSurface {
    pub applied: Option<ThemeMode>,
}

impl ThemeSurface for FlagSurface {
    fn apply(&mut self, mode: ThemeMode) {
        self.applied = Some(mode);
    }
}

/// Any stored value is an explicit choice: only `"dark"` means dark. With nothing
/// stored the ambient signal decides.
pub fn resolve_theme(stored: Option<&str>, ambient_dark: bool) -> ThemeMode {
    match stored {
        Some(value) => ThemeMode::from_dark(ThemeMode::parse(value) == Some(ThemeMode::Dark)),
        None => ThemeMode::from_dark(ambient_dark),
    }
}

pub struct PreferenceStore<S, T> {
    storage: S,
    surface: T,
    mode: ThemeMode,
}

impl<S: PreferenceStorage, T: ThemeSurface> PreferenceStore<S, T> {
    /// Resolves the theme once and applies it to the surface. The ambient signal
    /// is not consulted again after this.
    pub fn initialize(storage: S, ambient: &dyn AmbientScheme, mut surface: T) -> Self {
        let stored = match storage.get(THEME_STORAGE_KEY) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(error = %err, "stored theme unreadable; falling back to ambient");
                None
            }
        };
        let mode = resolve_theme(stored.as_deref(), ambient.prefers_dark());
        tracing::debug!(
            theme = mode.label(),
            from_storage = stored.is_some(),
            "theme resolved"
        );
        surface.apply(mode);
        Self {
            storage,
            surface,
            mode,
        }
    }

    pub fn mode(&self) -> ThemeMode {
        self.mode
    }

    pub fn is_dark(&self) -> bool {
        self.mode.is_dark()
    }

    /// Persists first so the flag never drifts from its storage slot.
    pub fn toggle(&mut self) -> Result<ThemeMode, StorageError> {
        let next = self.mode.toggled();
        self.storage.set(THEME_STORAGE_KEY, next.label())?;
        self.mode = next;
        self.surface.apply(next);
        tracing::debug!(theme = next.label(), "theme toggled");
        Ok(next)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn surface(&self) -> &T {
        &self.surface
    }

    pub fn into_storage(self) -> S {
        self.storage
    }
}
