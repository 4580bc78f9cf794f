//! The emoji picker context.
//!
//! [`EmojiPicker`] ties the search engine, usage tracker and result cache
//! together and is the only type frontends need. It is `Send + Sync`; share
//! it behind an `Arc` when several threads search and record usage.

use std::sync::Arc;

use crate::config::Config;
use crate::error::PickerResult;
use crate::services::cache::ResultCache;
use crate::services::dataset::DatasetSource;
use crate::services::usage::{JsonRanksFile, RanksStore, UsageStats, UsageTracker};

use super::search::{normalize_filter, order_by_usage, SearchEngine, SearchOptions};

/// Separator for [`EmojiPicker::search_line`].
pub const RESULT_SEPARATOR: &str = " ";

/// Separator for [`EmojiPicker::keywords_line`].
pub const KEYWORD_SEPARATOR: &str = ";";

pub struct EmojiPicker {
    engine: SearchEngine,
    usage: UsageTracker,
    cache: ResultCache,
    max_top_emojis: usize,
}

impl EmojiPicker {
    /// Create a picker reading the dataset and ranks from the configured paths.
    ///
    /// Nothing is read until the first query or [`EmojiPicker::initialize`].
    pub fn new(config: &Config) -> Self {
        let store = Arc::new(JsonRanksFile::new(config.ranks_path()));
        Self::with_store(DatasetSource::File(config.dataset_path()), store, config)
    }

    /// Create a picker over an explicit dataset and ranks store.
    pub fn with_store(
        source: DatasetSource,
        store: Arc<dyn RanksStore>,
        config: &Config,
    ) -> Self {
        let options = SearchOptions {
            max_results: config.search.max_results,
        };
        Self {
            engine: SearchEngine::new(source, options),
            usage: UsageTracker::new(store, config.write_delay()),
            cache: ResultCache::new(config.search.cache_capacity),
            max_top_emojis: config.search.max_top_emojis,
        }
    }

    /// Load the dataset, build the index and read usage ranks up front so the
    /// first query does not pay for it.
    pub fn initialize(&self) -> PickerResult<()> {
        let catalog = self.engine.catalog()?;
        let ranked = self.usage.load();
        tracing::info!(
            "Emoji picker ready: {} emojis, {} index keys, {} ranked",
            catalog.len(),
            catalog.index().len(),
            ranked
        );
        Ok(())
    }

    /// Emojis matching `filter`, most used first.
    ///
    /// A filter that is itself a known emoji returns just that emoji. Filters
    /// shorter than two characters after trimming return the whole dataset.
    pub fn search(&self, filter: &str) -> PickerResult<Vec<String>> {
        if let Some(emoji) = self.engine.direct_match(filter)? {
            return Ok(vec![emoji]);
        }

        let normalized = normalize_filter(filter);
        let ranks = self.usage.snapshot(self.max_top_emojis);

        if let Some(cached) = self.cache.get(&normalized, ranks.generation) {
            tracing::trace!("Cache hit for '{}'", normalized);
            return Ok(cached.to_vec());
        }

        let candidates = self.engine.candidates(&normalized)?;
        let ordered = order_by_usage(candidates, &ranks.top);
        self.cache
            .insert(normalized, ranks.generation, ordered.iter().cloned().collect());
        Ok(ordered)
    }

    /// [`EmojiPicker::search`] joined with single spaces.
    pub fn search_line(&self, filter: &str) -> PickerResult<String> {
        Ok(self.search(filter)?.join(RESULT_SEPARATOR))
    }

    /// Keywords of `emoji`, description first. Empty for unknown emojis.
    pub fn keywords(&self, emoji: &str) -> PickerResult<Vec<String>> {
        let catalog = self.engine.catalog()?;
        Ok(catalog
            .keywords(emoji.trim())
            .map(<[String]>::to_vec)
            .unwrap_or_default())
    }

    /// [`EmojiPicker::keywords`] joined with semicolons.
    pub fn keywords_line(&self, emoji: &str) -> PickerResult<String> {
        Ok(self.keywords(emoji)?.join(KEYWORD_SEPARATOR))
    }

    /// Count one use of `emoji` and schedule a write of the ranks.
    pub fn record_usage(&self, emoji: &str) {
        self.record_usage_by(emoji, 1);
    }

    /// Count `times` uses of `emoji`.
    pub fn record_usage_by(&self, emoji: &str, times: u32) {
        if times == 0 {
            return;
        }
        self.usage.increment(emoji, times);
        self.cache.clear();
        tracing::debug!("Recorded {} use(s) of {}", times, emoji);
    }

    /// Forget the usage count of `emoji`, returning what it was.
    pub fn remove_rank(&self, emoji: &str) -> Option<u32> {
        let removed = self.usage.remove(emoji);
        if removed.is_some() {
            self.cache.clear();
        }
        removed
    }

    /// Forget all usage counts and write the empty ranks immediately.
    pub fn reset_ranks(&self) -> PickerResult<()> {
        let result = self.usage.reset();
        self.cache.clear();
        result
    }

    pub fn top_emojis(&self, limit: usize) -> Vec<String> {
        self.usage.top_emojis(limit)
    }

    pub fn usage_count(&self, emoji: &str) -> u32 {
        self.usage.count(emoji)
    }

    /// Write pending usage changes now. Returns whether anything was written.
    ///
    /// Dropping the picker does not flush; call this before exiting.
    pub fn flush(&self) -> PickerResult<bool> {
        self.usage.flush()
    }

    pub fn stats(&self) -> UsageStats {
        self.usage.stats()
    }

    /// Number of memoized filters
    pub fn cached_results(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::dataset::EmojiRecord;
    use crate::services::usage::UsageRanks;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct MemoryStore {
        initial: UsageRanks,
        saves: Mutex<Vec<UsageRanks>>,
    }

    impl MemoryStore {
        fn with_ranks(ranks: &[(&str, u32)]) -> Self {
            Self {
                initial: ranks.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
                saves: Mutex::new(Vec::new()),
            }
        }

        fn save_count(&self) -> usize {
            self.saves.lock().unwrap().len()
        }
    }

    impl RanksStore for MemoryStore {
        fn load(&self) -> PickerResult<UsageRanks> {
            Ok(self.initial.clone())
        }

        fn save(&self, ranks: &UsageRanks) -> PickerResult<()> {
            self.saves.lock().unwrap().push(ranks.clone());
            Ok(())
        }
    }

    fn records() -> Vec<EmojiRecord> {
        vec![
            EmojiRecord::new("😀", "grinning face", &["grinning"], &["smile", "happy"]),
            EmojiRecord::new("😃", "grinning face with big eyes", &["smiley"], &["happy", "joy"]),
            EmojiRecord::new("😄", "grinning face with smiling eyes", &["smile"], &["happy", "joy"]),
            EmojiRecord::new("😁", "beaming face with smiling eyes", &["grin"], &[]),
            EmojiRecord::new("👀", "eyes", &["eyes"], &["look", "see", "watch"]),
            EmojiRecord::new("🧡", "orange heart", &["orange_heart"], &[]),
            EmojiRecord::new("🎉", "party popper", &["tada"], &["hooray", "party"]),
            EmojiRecord::new("🐒", "monkey", &["monkey"], &[]),
            EmojiRecord::new("🐵", "monkey face", &["monkey_face"], &[]),
            EmojiRecord::new("🙈", "see-no-evil monkey", &["see_no_evil"], &["monkey", "blind", "ignore"]),
            EmojiRecord::new("📆", "tear-off calendar", &["calendar"], &["schedule"]),
        ]
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.usage.write_delay_ms = 50;
        config
    }

    /// Writer never fires on its own during a test
    fn slow_config() -> Config {
        let mut config = Config::default();
        config.usage.write_delay_ms = 60_000;
        config
    }

    fn picker_with(store: Arc<MemoryStore>) -> EmojiPicker {
        EmojiPicker::with_store(DatasetSource::Records(records()), store, &config())
    }

    fn picker() -> EmojiPicker {
        picker_with(Arc::new(MemoryStore::default()))
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_initialize() {
        let store = Arc::new(MemoryStore::with_ranks(&[("🐒", 3)]));
        let picker = picker_with(store);
        picker.initialize().unwrap();
        assert_eq!(picker.usage_count("🐒"), 3);
        assert_eq!(picker.stats().tracked_emojis, 1);
    }

    #[test]
    fn test_short_filter_returns_whole_dataset() {
        let picker = picker();
        let all = picker.search("").unwrap();
        assert_eq!(all.len(), records().len());
        assert_eq!(picker.search("a").unwrap(), all);
        assert_eq!(picker.search("  M ").unwrap(), all);
    }

    #[test]
    fn test_filter_normalized() {
        let picker = picker();
        assert_eq!(
            picker.search("  MONKEY ").unwrap(),
            picker.search("monkey").unwrap()
        );
    }

    #[test]
    fn test_monkey_search_ranks_used_emoji_first() {
        let picker = picker();
        assert_eq!(picker.search("monkey").unwrap(), strings(&["🐒", "🐵", "🙈"]));

        picker.record_usage("🙈");
        assert_eq!(picker.search("monkey").unwrap(), strings(&["🙈", "🐒", "🐵"]));
    }

    #[test]
    fn test_ranked_emojis_lead_empty_search() {
        let store = Arc::new(MemoryStore::with_ranks(&[
            ("👀", 6),
            ("🧡", 5),
            ("🎉", 4),
            ("🐒", 2),
        ]));
        let picker = picker_with(store);

        let results = picker.search("").unwrap();
        assert_eq!(
            &results[..8],
            &strings(&["👀", "🧡", "🎉", "🐒", "😀", "😃", "😄", "😁"])[..]
        );
    }

    #[test]
    fn test_prefixes_resolve() {
        let picker = picker();
        for filter in ["ca", "cal", "calendar", "te", "tear", "off", "sch"] {
            assert_eq!(picker.search(filter).unwrap(), strings(&["📆"]), "{}", filter);
        }
        assert_eq!(picker.search("orange heart").unwrap(), strings(&["🧡"]));
        assert_eq!(picker.search("evil").unwrap(), strings(&["🙈"]));
        assert!(picker.search("zebra").unwrap().is_empty());
    }

    #[test]
    fn test_search_by_glyph() {
        let picker = picker();
        assert_eq!(picker.search("🐒").unwrap(), strings(&["🐒"]));
        assert_eq!(picker.search_line(" 🧡 ").unwrap(), "🧡");
    }

    #[test]
    fn test_search_line_joins_with_spaces() {
        let picker = picker();
        assert_eq!(picker.search_line("monkey").unwrap(), "🐒 🐵 🙈");
        assert_eq!(picker.search_line("zebra").unwrap(), "");
    }

    #[test]
    fn test_keywords() {
        let picker = picker();
        assert_eq!(
            picker.keywords("🐵").unwrap(),
            strings(&["monkey face"])
        );
        assert_eq!(
            picker.keywords_line("🙈").unwrap(),
            "see-no-evil monkey;blind;monkey;ignore;see no evil"
        );
        assert_eq!(picker.keywords_line("🏴‍☠️🦄").unwrap(), "");
    }

    #[test]
    fn test_search_is_cached_and_repeatable() {
        let picker = picker();
        let first = picker.search("happy").unwrap();
        assert_eq!(picker.cached_results(), 1);
        assert_eq!(picker.search("happy").unwrap(), first);
        assert_eq!(picker.search("Happy ").unwrap(), first);
        assert_eq!(picker.cached_results(), 1);
    }

    #[test]
    fn test_record_usage_invalidates_cache() {
        let picker = picker();
        assert_eq!(picker.search("happy").unwrap(), strings(&["😀", "😃", "😄"]));
        assert_eq!(picker.cached_results(), 1);

        picker.record_usage("😄");
        assert_eq!(picker.cached_results(), 0);
        assert_eq!(picker.search("happy").unwrap(), strings(&["😄", "😀", "😃"]));
    }

    #[test]
    fn test_record_unknown_emoji() {
        let picker = picker();
        picker.record_usage("🚀");
        assert_eq!(picker.usage_count("🚀"), 1);
        assert_eq!(picker.top_emojis(10), strings(&["🚀"]));
        // Not in the dataset, so it never shows up in results
        assert!(!picker.search("").unwrap().contains(&"🚀".to_string()));
    }

    #[test]
    fn test_record_usage_by() {
        let picker = picker();
        picker.record_usage_by("🎉", 3);
        picker.record_usage_by("🎉", 0);
        picker.record_usage("🧡");
        assert_eq!(picker.usage_count("🎉"), 3);
        assert_eq!(picker.top_emojis(10), strings(&["🎉", "🧡"]));
        assert_eq!(picker.stats().total_uses, 4);
    }

    #[test]
    fn test_top_emojis_limit_respected() {
        let mut config = config();
        config.search.max_top_emojis = 1;
        let picker = EmojiPicker::with_store(
            DatasetSource::Records(records()),
            Arc::new(MemoryStore::with_ranks(&[("🐵", 9), ("🙈", 5)])),
            &config,
        );
        assert_eq!(picker.search("monkey").unwrap(), strings(&["🐵", "🐒", "🙈"]));
    }

    #[test]
    fn test_usage_ordering_disabled() {
        let mut config = config();
        config.search.max_top_emojis = 0;
        let picker = EmojiPicker::with_store(
            DatasetSource::Records(records()),
            Arc::new(MemoryStore::with_ranks(&[("🙈", 5)])),
            &config,
        );
        assert_eq!(picker.search("monkey").unwrap(), strings(&["🐒", "🐵", "🙈"]));
    }

    #[test]
    fn test_remove_rank() {
        let picker = picker();
        picker.record_usage("🙈");
        picker.search("monkey").unwrap();

        assert_eq!(picker.remove_rank("🙈"), Some(1));
        assert_eq!(picker.cached_results(), 0);
        assert_eq!(picker.search("monkey").unwrap(), strings(&["🐒", "🐵", "🙈"]));
        assert_eq!(picker.remove_rank("🙈"), None);
    }

    #[test]
    fn test_reset_ranks_writes_immediately() {
        let store = Arc::new(MemoryStore::with_ranks(&[("🐒", 2)]));
        let picker = picker_with(Arc::clone(&store));

        picker.reset_ranks().unwrap();
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.saves.lock().unwrap()[0], UsageRanks::new());
        assert!(picker.top_emojis(10).is_empty());
    }

    #[test]
    fn test_burst_of_usage_written_once() {
        let store = Arc::new(MemoryStore::default());
        let picker = picker_with(Arc::clone(&store));

        for _ in 0..5 {
            picker.record_usage("🐒");
        }
        std::thread::sleep(Duration::from_millis(300));

        assert_eq!(store.save_count(), 1);
        assert_eq!(store.saves.lock().unwrap()[0].get("🐒"), Some(&5));
    }

    #[test]
    fn test_flush() {
        let store = Arc::new(MemoryStore::default());
        let picker = EmojiPicker::with_store(
            DatasetSource::Records(records()),
            Arc::clone(&store) as Arc<dyn RanksStore>,
            &slow_config(),
        );

        assert!(!picker.flush().unwrap());
        picker.record_usage("🎉");
        assert!(picker.flush().unwrap());
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn test_missing_dataset_yields_empty_results() {
        let dir = tempfile::tempdir().unwrap();
        let picker = EmojiPicker::with_store(
            DatasetSource::File(dir.path().join("missing.json")),
            Arc::new(MemoryStore::default()),
            &config(),
        );
        picker.initialize().unwrap();
        assert!(picker.search("").unwrap().is_empty());
        assert!(picker.search("monkey").unwrap().is_empty());
        assert_eq!(picker.keywords_line("🐒").unwrap(), "");
    }

    #[test]
    fn test_file_backed_picker() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = dir.path().join("emoji.json");
        std::fs::write(
            &dataset,
            r#"[{"emoji":"🐒","description":"monkey","aliases":["monkey"],"tags":[]},
                {"emoji":"🍌","description":"banana","aliases":["banana"],"tags":["fruit"]}]"#,
        )
        .unwrap();

        let mut config = slow_config();
        config.paths.dataset = dataset.to_string_lossy().into_owned();
        config.paths.ranks = dir.path().join("ranks.json").to_string_lossy().into_owned();

        let picker = EmojiPicker::new(&config);
        picker.record_usage("🍌");
        assert_eq!(picker.search("").unwrap(), strings(&["🍌", "🐒"]));
        assert!(picker.flush().unwrap());
        drop(picker);

        let reopened = EmojiPicker::new(&config);
        assert_eq!(reopened.usage_count("🍌"), 1);
        assert_eq!(reopened.search_line("fr").unwrap(), "🍌");
    }

    #[test]
    fn test_concurrent_search_and_usage() {
        let picker = Arc::new(picker());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let picker = Arc::clone(&picker);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        if i % 2 == 0 {
                            picker.record_usage("🐵");
                        } else {
                            picker.search("monkey").unwrap();
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(picker.usage_count("🐵"), 50);
        assert_eq!(picker.search("monkey").unwrap()[0], "🐵");
    }
}
