//! Emoji dataset loading.
//!
//! The dataset is a JSON array of records read once per process. A dataset
//! that cannot be read leaves the picker usable with no emojis.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::error::{PickerError, PickerResult};

/// One emoji with its searchable metadata, as stored in the dataset file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmojiRecord {
    #[serde(rename = "emoji")]
    pub symbol: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unicode_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ios_version: Option<String>,
}

impl EmojiRecord {
    pub fn new(symbol: &str, description: &str, aliases: &[&str], tags: &[&str]) -> Self {
        Self {
            symbol: symbol.to_string(),
            description: description.to_string(),
            aliases: aliases.iter().map(|s| s.to_string()).collect(),
            tags: tags.iter().map(|s| s.to_string()).collect(),
            category: None,
            unicode_version: None,
            ios_version: None,
        }
    }
}

/// Where the records come from.
#[derive(Debug, Clone)]
pub enum DatasetSource {
    File(PathBuf),
    /// Records already in memory (embedding hosts, tests, benchmarks)
    Records(Vec<EmojiRecord>),
}

/// Loads the dataset on first use and hands out the same collection afterwards.
#[derive(Debug)]
pub struct DatasetLoader {
    source: DatasetSource,
    records: OnceCell<Arc<[EmojiRecord]>>,
}

impl DatasetLoader {
    pub fn new(source: DatasetSource) -> Self {
        Self {
            source,
            records: OnceCell::new(),
        }
    }

    /// Get the dataset, reading it on the first call.
    ///
    /// Returns an empty collection if the source is unreadable or malformed.
    pub fn load(&self) -> Arc<[EmojiRecord]> {
        self.records
            .get_or_init(|| match self.read_source() {
                Ok(records) => {
                    tracing::info!("Loaded {} emojis", records.len());
                    records.into()
                }
                Err(e) => {
                    tracing::warn!("{}; continuing with an empty dataset", e);
                    Arc::from(Vec::new())
                }
            })
            .clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.records.get().is_some()
    }

    fn read_source(&self) -> PickerResult<Vec<EmojiRecord>> {
        match &self.source {
            DatasetSource::File(path) => read_dataset(path),
            DatasetSource::Records(records) => Ok(records.clone()),
        }
    }
}

/// Read and parse a dataset file.
pub fn read_dataset(path: &Path) -> PickerResult<Vec<EmojiRecord>> {
    let content = fs::read_to_string(path).map_err(|e| {
        PickerError::DatasetUnavailable(format!("cannot read {}: {}", path.display(), e))
    })?;

    serde_json::from_str(&content).map_err(|e| {
        PickerError::DatasetUnavailable(format!("cannot parse {}: {}", path.display(), e))
    })
}
