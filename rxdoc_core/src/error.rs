//! Error types for the rxdoc_core library.

use std::io;
use std::path::PathBuf;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for rxdoc_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A date field could not be parsed or shifted
    #[error("Invalid date in {field}: {value:?}")]
    InvalidDate { field: &'static str, value: String },

    /// A page capacity of zero reached the splitter
    #[error("Layout capacity exhausted (capacity {capacity})")]
    LayoutCapacityExhausted { capacity: usize },

    /// The document sink rejected the write
    #[error("Failed to write document to {path:?}: {source}")]
    SinkWriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The canvas does not hold the pages the layout describes
    #[error("Page count mismatch: layout has {expected} pages, canvas has {actual}")]
    PageCountMismatch { expected: usize, actual: usize },

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// PDF backend error
    #[error("PDF error: {0}")]
    Pdf(String),
}

impl Error {
    pub(crate) fn invalid_date(field: &'static str, value: impl Into<String>) -> Self {
        Error::InvalidDate {
            field,
            value: value.into(),
        }
    }
}
