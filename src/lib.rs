//! Emoji picker - keyword search over an emoji dataset, ordered by usage.
//!
//! Filters are matched against an inverted index of every keyword prefix, and
//! the emojis used most often are pulled to the front of each result.
//!
//! # Architecture
//!
//! The library is organized into these main modules:
//!
//! - [`config`] - Configuration loading and management
//! - [`core`] - Search engine and the [`EmojiPicker`] context
//! - [`services`] - Dataset loading, keywords, index, usage ranks and result cache
//! - [`cli`] - Command line frontend
//!
//! # FFI Layer
//!
//! Native frontends interact via the C FFI layer in [`ffi`]. Results cross
//! the boundary as space-joined emojis and keywords as semicolon-joined text.
//!
//! # Example
//!
//! ```ignore
//! use emoji_picker::{Config, EmojiPicker};
//!
//! let picker = EmojiPicker::new(&Config::load());
//! let line = picker.search_line("monkey")?;
//! picker.record_usage("🐒");
//! picker.flush()?;
//! ```

// Public modules
pub mod cli;
pub mod config;
pub mod core;
pub mod services;

// FFI module - internal implementation details
#[doc(hidden)]
pub mod ffi;

mod error;

// Re-export commonly used types for convenience
pub use config::Config;
pub use core::EmojiPicker;
pub use error::{PickerError, PickerResult};
pub use services::usage::UsageStats;
