//! Chronicle transparency log client
//!
//! This crate queries a Chronicle instance for records attesting to a CA
//! bundle, checks the signed envelope of the response against the log's own
//! key, and validates the individual records against the trust anchors.

pub mod client;
pub mod entry;
pub mod envelope;
pub mod error;
pub mod transport;

pub use client::{ChronicleClient, CHRONICLE_KEY, CHRONICLE_PUBKEY, CHRONICLE_URL};
pub use entry::{LogRecord, LookupResponse, RecordExpectation, Strictness};
pub use envelope::{decode_signed_json, BODY_SIGNATURE_HEADER};
pub use error::{Error, Result};
pub use transport::{HttpResponse, HttpTransport, MemoryTransport, Transport};
