//! Error types for certainty

use thiserror::Error;

/// Errors that can occur while selecting or synchronizing CA bundles
#[derive(Error, Debug)]
pub enum Error {
    /// Missing data directory, missing or unreadable catalog, bad URL
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The catalog lock could not be taken
    #[error("Lock error: {0}")]
    Lock(String),

    /// A quarantine targeted a row the persisted catalog does not have
    #[error("Catalog has no row at index {0}")]
    QuarantineIndex(usize),

    /// Types error
    #[error("Types error: {0}")]
    Types(#[from] certainty_types::Error),

    /// Crypto error
    #[error("Crypto error: {0}")]
    Crypto(#[from] certainty_crypto::Error),

    /// Cache marker error
    #[error("Cache error: {0}")]
    Cache(#[from] certainty_cache::Error),

    /// Transparency log integrity or transport error
    #[error("Chronicle error: {0}")]
    Chronicle(#[from] certainty_chronicle::Error),

    /// Catalog synchronization aborted
    #[error("Sync error: {0}")]
    Sync(String),

    /// HTTP client construction error
    #[error("HTTP error: {0}")]
    Http(String),

    /// Every candidate bundle was rejected
    #[error("No valid CA bundle found")]
    NoValidBundle,
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::Config(format!("invalid URL: {}", err))
    }
}

/// Result type for certainty operations
pub type Result<T> = std::result::Result<T, Error>;
