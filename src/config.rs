use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{PickerError, PickerResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub search: SearchConfig,
    pub usage: UsageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Emoji dataset (JSON array of records)
    pub dataset: String,
    /// Usage ranks file (flat JSON object of emoji -> count)
    pub ranks: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// How many of the most used emojis are pulled to the front of results.
    /// Zero turns usage ordering off.
    pub max_top_emojis: usize,
    pub max_results: usize,
    pub cache_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageConfig {
    /// Quiet period before usage ranks are written to disk
    pub write_delay_ms: u64,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let data_dir = Config::data_dir();
        Self {
            dataset: data_dir.join("emoji.json").to_string_lossy().into_owned(),
            ranks: data_dir.join("ranks.json").to_string_lossy().into_owned(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_top_emojis: 10,
            max_results: 2000,
            cache_capacity: 128,
        }
    }
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            write_delay_ms: 2000,
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .map(|h| h.join(".config"))
                    .unwrap_or_else(|| PathBuf::from("/tmp"))
            })
            .join("emoji-picker")
            .join("config.toml")
    }

    /// Directory holding the dataset and ranks files by default
    fn data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .map(|h| h.join(".local").join("share"))
                    .unwrap_or_else(|| PathBuf::from("/tmp"))
            })
            .join("emoji-picker")
    }

    /// Load config from the default location, or return defaults if not found
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load config from `path`, falling back to defaults on any error
    pub fn load_from(path: &Path) -> Self {
        let mut config = if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config {}: {}", path.display(), e);
                        Self::default()
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config {}: {}", path.display(), e);
                    Self::default()
                }
            }
        } else {
            Self::default()
        };

        config.validate();
        config
    }

    /// Validate and clamp config values to acceptable ranges
    fn validate(&mut self) {
        self.search.max_top_emojis = self.search.max_top_emojis.min(100);
        self.search.max_results = self.search.max_results.clamp(1, 100_000);
        self.search.cache_capacity = self.search.cache_capacity.clamp(1, 4096);
        self.usage.write_delay_ms = self.usage.write_delay_ms.clamp(10, 60_000);
    }

    /// Save config to the default location
    pub fn save(&self) -> PickerResult<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> PickerResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| PickerError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, content)?;
        Ok(())
    }

    /// Dataset path with `~` and environment variables expanded
    pub fn dataset_path(&self) -> PathBuf {
        expand_path(&self.paths.dataset)
    }

    /// Ranks path with `~` and environment variables expanded
    pub fn ranks_path(&self) -> PathBuf {
        expand_path(&self.paths.ranks)
    }

    pub fn write_delay(&self) -> Duration {
        Duration::from_millis(self.usage.write_delay_ms)
    }
}

fn expand_path(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(e) => {
            tracing::debug!("Could not expand path '{}': {}", raw, e);
            PathBuf::from(raw)
        }
    }
}
