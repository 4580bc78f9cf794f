//! Inverted prefix index over emoji keywords.
//!
//! Every keyword of at least [`MIN_KEYWORD_LENGTH`] characters is indexed
//! under each of its prefixes, so a lookup of what the user has typed so far
//! is a single map access. Multi-word keywords are also indexed word by word,
//! with hyphens treated as word breaks:
//!
//! ```text
//! "tear-off calendar" -> te, tea, tear, tear-, ... , tear-off calendar
//!                        te, tea, tear
//!                        of, off
//!                        ca, cal, ... , calendar
//! ```

use std::collections::HashMap;

use crate::error::{PickerError, PickerResult};

/// Shortest keyword, word or prefix that gets an index entry.
pub const MIN_KEYWORD_LENGTH: usize = 2;

/// Maps a keyword or keyword prefix to the positions of the emojis that
/// produced it. Positions are sorted and unique.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    entries: HashMap<String, Vec<u32>>,
}

impl InvertedIndex {
    /// Build the index from per-emoji keyword lists.
    ///
    /// `keywords[i]` belongs to the emoji at position `i`.
    pub fn build(keywords: &[Vec<String>]) -> PickerResult<Self> {
        let mut index = Self::default();

        for (position, emoji_keywords) in keywords.iter().enumerate() {
            let position = u32::try_from(position).map_err(|_| {
                PickerError::IndexBuild(format!(
                    "dataset has {} emojis, more than the index can address",
                    keywords.len()
                ))
            })?;

            for keyword in emoji_keywords {
                index.insert_prefixes(keyword, position);

                let dashless = keyword.replace('-', " ");
                let words: Vec<&str> = dashless.split_whitespace().collect();
                if words.len() > 1 {
                    for word in words {
                        index.insert_prefixes(word, position);
                    }
                }
            }
        }

        for positions in index.entries.values_mut() {
            positions.sort_unstable();
            positions.dedup();
        }

        tracing::info!("Built index for {} keys", index.entries.len());
        Ok(index)
    }

    /// Index `term` under every prefix from [`MIN_KEYWORD_LENGTH`] characters
    /// up to the whole term.
    fn insert_prefixes(&mut self, term: &str, position: u32) {
        for (count, (start, ch)) in term.char_indices().enumerate() {
            if count + 1 < MIN_KEYWORD_LENGTH {
                continue;
            }
            let prefix = &term[..start + ch.len_utf8()];
            match self.entries.get_mut(prefix) {
                Some(positions) => positions.push(position),
                None => {
                    self.entries.insert(prefix.to_string(), vec![position]);
                }
            }
        }
    }

    /// Positions of emojis indexed under exactly `key`.
    pub fn get(&self, key: &str) -> &[u32] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
