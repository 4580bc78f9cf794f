//! Core engine module.
//!
//! - [`search`] - dataset catalog, filter resolution and usage ordering
//! - [`picker`] - the [`EmojiPicker`] context used by every frontend

pub mod picker;
pub mod search;

pub use picker::EmojiPicker;
pub use search::{order_by_usage, Catalog, SearchEngine, SearchOptions};
