//! Error types for certainty-types

use thiserror::Error;

/// Errors that can occur in certainty-types
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid encoding (hex)
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),
}

/// Result type for certainty-types operations
pub type Result<T> = std::result::Result<T, Error>;
