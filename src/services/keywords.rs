//! Keyword extraction for emoji records.
//!
//! Each emoji gets an ordered keyword list: its normalized description first,
//! then aliases and tags shortest-first with duplicates removed.

use std::collections::HashSet;

use super::dataset::EmojiRecord;

/// Lowercase and turn underscores into spaces.
///
/// `"Monkey_Face"` becomes `"monkey face"`.
pub fn normalize(term: &str) -> String {
    term.to_lowercase().replace('_', " ")
}

/// Comparison form used to drop tail entries that only differ from the
/// description by dashes.
fn description_variant(term: &str) -> String {
    term.replace('-', " ")
}

/// Build the keyword list for one record.
///
/// The first entry is always the normalized description (even when empty).
/// The tail is sorted by character count with a stable sort, so ties keep
/// their alias-then-tag order.
pub fn extract_keywords(record: &EmojiRecord) -> Vec<String> {
    let description = normalize(&record.description);

    let mut tail: Vec<String> = record
        .aliases
        .iter()
        .chain(record.tags.iter())
        .map(|kw| normalize(kw))
        .collect();
    tail.sort_by_key(|kw| kw.chars().count());

    let anchor_variant = description_variant(&description);
    let mut seen: HashSet<String> = HashSet::with_capacity(tail.len() + 1);
    seen.insert(description.clone());

    let mut keywords = Vec::with_capacity(tail.len() + 1);
    keywords.push(description);

    for keyword in tail {
        if seen.contains(&keyword) || description_variant(&keyword) == anchor_variant {
            continue;
        }
        seen.insert(keyword.clone());
        keywords.push(keyword);
    }

    keywords
}
