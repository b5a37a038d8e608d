//! Error types for certainty-chronicle

use thiserror::Error;

/// Errors that can occur in Chronicle operations
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(String),

    /// Invalid instance URL
    #[error("Invalid URL: {0}")]
    Url(String),

    /// API error (non-success status)
    #[error("API error: {0}")]
    Api(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No envelope signature on the response verified under the log key
    #[error("No valid signature given for this HTTP response")]
    InvalidEnvelope,

    /// A log record is missing its signature, contents or public key
    #[error("Incomplete data")]
    IncompleteRecord,

    /// A record claiming a trusted key carries an invalid signature
    #[error("Invalid signature")]
    InvalidRecordSignature,

    /// A record does not mention the expected digest
    #[error("SHA256 hash not present in response body")]
    DigestNotPresent,

    /// A record does not mention the expected repository
    #[error("Repository name not present in response body")]
    RepositoryNotPresent,

    /// Crypto error (key or base64 decoding)
    #[error("Crypto error: {0}")]
    Crypto(#[from] certainty_crypto::Error),
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::Url(e.to_string())
    }
}

/// Result type for Chronicle operations
pub type Result<T> = std::result::Result<T, Error>;
