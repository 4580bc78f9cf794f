//! Search engine for the emoji picker.
//!
//! Owns the dataset and everything derived from it (keywords and the prefix
//! index), built once on first use, and resolves filters to candidate emojis.
//! Ordering by usage is a pure function over a candidate list and the current
//! top emojis, see [`order_by_usage`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::PickerResult;
use crate::services::dataset::{DatasetLoader, DatasetSource, EmojiRecord};
use crate::services::index::InvertedIndex;
use crate::services::keywords::extract_keywords;

/// Filters shorter than this (in characters) list the whole dataset.
pub const MIN_SEARCH_LENGTH: usize = 2;

/// Default cap on candidates per query.
pub const MAX_SEARCH_RESULTS: usize = 2000;

/// Text presentation selector that some inputs append to an emoji.
const VARIATION_SELECTOR_16: char = '\u{FE0F}';

/// Keywords and index for a loaded dataset. Immutable once built.
#[derive(Debug)]
pub struct Catalog {
    /// Unique symbols in dataset order
    symbols: Vec<String>,
    /// `keywords[i]` belongs to `symbols[i]`
    keywords: Vec<Vec<String>>,
    positions: HashMap<String, usize>,
    index: InvertedIndex,
}

impl Catalog {
    /// Extract keywords for every record and index them.
    ///
    /// A symbol listed more than once keeps its first record.
    pub fn build(records: &[EmojiRecord]) -> PickerResult<Self> {
        let mut symbols = Vec::with_capacity(records.len());
        let mut keywords = Vec::with_capacity(records.len());
        let mut positions = HashMap::with_capacity(records.len());

        for record in records {
            if positions.contains_key(&record.symbol) {
                tracing::warn!("Duplicate emoji '{}' in dataset, keeping the first", record.symbol);
                continue;
            }
            positions.insert(record.symbol.clone(), symbols.len());
            symbols.push(record.symbol.clone());
            keywords.push(extract_keywords(record));
        }
        tracing::info!("Built keywords for {} emojis", keywords.len());

        let index = InvertedIndex::build(&keywords)?;

        Ok(Self {
            symbols,
            keywords,
            positions,
            index,
        })
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// All symbols in dataset order
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }

    pub fn keywords(&self, symbol: &str) -> Option<&[String]> {
        self.positions
            .get(symbol)
            .map(|&position| self.keywords[position].as_slice())
    }

    pub fn index(&self) -> &InvertedIndex {
        &self.index
    }

    /// Symbols indexed under exactly `key`, in dataset order.
    pub fn lookup(&self, key: &str, limit: usize) -> Vec<String> {
        self.index
            .get(key)
            .iter()
            .take(limit)
            .filter_map(|&position| self.symbols.get(position as usize))
            .cloned()
            .collect()
    }
}

/// Search tuning, usually taken from [`crate::config::SearchConfig`].
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub max_results: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_results: MAX_SEARCH_RESULTS,
        }
    }
}

/// Resolves filters against the catalog, building it on first use.
pub struct SearchEngine {
    dataset: DatasetLoader,
    catalog: OnceCell<Arc<Catalog>>,
    options: SearchOptions,
}

impl SearchEngine {
    pub fn new(source: DatasetSource, options: SearchOptions) -> Self {
        Self {
            dataset: DatasetLoader::new(source),
            catalog: OnceCell::new(),
            options,
        }
    }

    /// Get the catalog, building it if this is the first call.
    ///
    /// Concurrent first callers wait for a single build. A failed build is
    /// returned to the caller and retried on the next call.
    pub fn catalog(&self) -> PickerResult<&Arc<Catalog>> {
        self.catalog.get_or_try_init(|| {
            let records = self.dataset.load();
            Catalog::build(&records).map(Arc::new).map_err(|e| {
                tracing::error!("{}", e);
                e
            })
        })
    }

    /// Whether the catalog has been built.
    pub fn is_ready(&self) -> bool {
        self.catalog.get().is_some()
    }

    /// If `filter` is itself a known emoji (with or without a trailing
    /// variation selector), that emoji.
    pub fn direct_match(&self, filter: &str) -> PickerResult<Option<String>> {
        let catalog = self.catalog()?;
        let filter = filter.trim();

        if filter.is_empty() {
            return Ok(None);
        }
        if catalog.contains(filter) {
            return Ok(Some(filter.to_string()));
        }

        let stripped: String = filter
            .chars()
            .filter(|&c| c != VARIATION_SELECTOR_16)
            .collect();
        if stripped != filter && catalog.contains(&stripped) {
            return Ok(Some(stripped));
        }
        Ok(None)
    }

    /// Unordered candidates for an already normalized filter, in dataset order.
    pub fn candidates(&self, normalized: &str) -> PickerResult<Vec<String>> {
        let catalog = self.catalog()?;
        let limit = self.options.max_results;

        if normalized.chars().count() < MIN_SEARCH_LENGTH {
            tracing::debug!("Getting all emojis (filter too short)");
            return Ok(catalog.symbols().iter().take(limit).cloned().collect());
        }

        tracing::debug!("Getting emojis for filter '{}'", normalized);
        Ok(catalog.lookup(normalized, limit))
    }
}

/// Lowercase and trim a user filter.
pub fn normalize_filter(filter: &str) -> String {
    filter.trim().to_lowercase()
}

/// Pull candidates that are among the `top` emojis to the front, in `top`
/// order. Everything else keeps its relative order after them.
pub fn order_by_usage(candidates: Vec<String>, top: &[String]) -> Vec<String> {
    if top.is_empty() {
        return candidates;
    }

    let top_set: HashSet<&str> = top.iter().map(String::as_str).collect();
    let candidate_set: HashSet<&str> = candidates.iter().map(String::as_str).collect();

    let mut ordered: Vec<String> = top
        .iter()
        .filter(|emoji| candidate_set.contains(emoji.as_str()))
        .cloned()
        .collect();
    ordered.reserve(candidates.len().saturating_sub(ordered.len()));

    ordered.extend(
        candidates
            .iter()
            .filter(|emoji| !top_set.contains(emoji.as_str()))
            .cloned(),
    );
    ordered
}
