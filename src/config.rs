use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Externally-provided settings: where the backend lives and how the optional
/// location beacon behaves. Loaded from a TOML file in the user config dir;
/// any load failure falls back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub base_url: String,
    #[serde(default = "default_topic")]
    pub beacon_topic: String,
    #[serde(default = "default_interval")]
    pub beacon_interval_secs: u64,
}

fn default_topic() -> String {
    "alert/location".to_string()
}

fn default_interval() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            beacon_topic: default_topic(),
            beacon_interval_secs: default_interval(),
        }
    }
}

impl Config {
    fn default_path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        Some(base.config_dir().join("sos-client").join("config.toml"))
    }

    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::from_path(&path),
            None => Self::default(),
        }
    }

    pub fn from_path(path: &std::path::Path) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|text| toml::from_str(&text).ok())
            .unwrap_or_default()
    }

    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::default_path()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "no config dir"))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
        fs::write(path, text)
    }
}
