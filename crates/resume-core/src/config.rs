use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigError;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AgentConfig {
    pub responder: ResponderConfig,
    pub preferences: PreferencesConfig,
    pub log_filter: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            responder: ResponderConfig::default(),
            preferences: PreferencesConfig::default(),
            log_filter: "warn".to_string(),
        }
    }
}

impl AgentConfig {
    /// A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn parse(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|err| err.to_string())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ResponderConfig {
    pub stub_delay_ms: u64,
    pub timeout_ms: Option<u64>,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            stub_delay_ms: 1_000,
            timeout_ms: None,
        }
    }
}

impl ResponderConfig {
    pub fn stub_delay(&self) -> Duration {
        Duration::from_millis(self.stub_delay_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct PreferencesConfig {
    pub storage_dir: Option<PathBuf>,
    pub ambient_dark: Option<bool>,
}
