pub mod cache;
pub mod dataset;
pub mod index;
pub mod keywords;
pub mod usage;

pub use cache::ResultCache;
pub use dataset::{DatasetLoader, DatasetSource, EmojiRecord};
pub use index::InvertedIndex;
pub use keywords::extract_keywords;
pub use usage::{JsonRanksFile, RankSnapshot, RanksStore, UsageRanks, UsageStats, UsageTracker};
