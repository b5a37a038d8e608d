//! Core types for Certainty
//!
//! This crate provides the data structures shared by the catalog, the
//! verification engine and the synchronization protocol: the immutable
//! [`BundleRecord`], the persisted [`CatalogEntry`] row, trust channels and
//! hex-encoded fields.

pub mod bundle;
pub mod catalog;
pub mod encoding;
pub mod error;

pub use bundle::{BundleRecord, TrustChannel, DEFAULT_TRUST_CHANNEL};
pub use catalog::CatalogEntry;
pub use encoding::Hex;
pub use error::{Error, Result};
