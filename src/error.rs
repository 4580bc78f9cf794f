//! Error types for the emoji picker
//!
//! Most of these are recovered where they occur and only logged. The one
//! that reaches callers of the search API is [`PickerError::IndexBuild`].

use thiserror::Error;

/// Errors that can occur in the emoji picker
#[derive(Debug, Error)]
pub enum PickerError {
    /// The emoji dataset could not be read or parsed
    #[error("Dataset unavailable: {0}")]
    DatasetUnavailable(String),

    /// Persisted usage ranks could not be read or parsed
    #[error("Ranks unavailable: {0}")]
    RanksUnavailable(String),

    /// The keyword table or search index could not be built from a loaded dataset
    #[error("Index build failed: {0}")]
    IndexBuild(String),

    /// Usage ranks could not be persisted
    #[error("Failed to write ranks: {0}")]
    WriteFailed(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bad input at a boundary (null pointers, invalid UTF-8)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("Config parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Result type alias for picker operations
pub type PickerResult<T> = Result<T, PickerError>;
