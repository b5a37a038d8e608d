//! Verified CA bundle selection
//!
//! This crate answers one question: which locally cached CA bundle is the
//! newest one that is provably authentic? A bundle is accepted once its
//! digest matches the catalog, its Ed25519 signature verifies under a trust
//! anchor, and the Chronicle transparency log holds a matching attestation.
//!
//! ```no_run
//! # async fn example() -> certainty::Result<()> {
//! use certainty::{RemoteFetch, SelectionPolicy, TrustChannel};
//!
//! let fetch = RemoteFetch::new("/var/lib/certainty").await?;
//! let bundle = fetch
//!     .latest_bundle(&TrustChannel::default(), SelectionPolicy::default())
//!     .await?;
//! println!("{}", bundle.file_path().display());
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod fetch;
pub mod http;
pub mod remote;
pub mod validator;

use std::path::Path;

// Re-export core crates
pub use certainty_cache as cache;
pub use certainty_chronicle as chronicle;
pub use certainty_crypto as crypto;
pub use certainty_types as types;

pub use catalog::{selection_key, Candidate, Catalog, CATALOG_FILE};
pub use certainty_chronicle::Strictness;
pub use certainty_types::{BundleRecord, TrustChannel, DEFAULT_TRUST_CHANNEL};
pub use config::{
    default_data_dir, ChronicleConfig, RemoteConfig, SelectionPolicy, Timeouts, ValidatorConfig,
    DEFAULT_REPOSITORY,
};
pub use error::{Error, Result};
pub use fetch::{CheckDefaults, Fetch};
pub use http::{bootstrap_transport, http_client};
pub use remote::{RefreshReport, RemoteFetch};
pub use validator::{BundleValidator, Validator};

/// Repository identifier expected in transparency log records
pub fn repository() -> &'static str {
    DEFAULT_REPOSITORY
}

/// Contents of the newest verified bundle of the default channel
///
/// Synchronizes `data_dir` (or the platform data directory) from the default
/// remote source when the cache is stale.
pub async fn get_latest_ca_bundle(data_dir: Option<&Path>) -> Result<Vec<u8>> {
    let data_dir = match data_dir {
        Some(dir) => dir.to_path_buf(),
        None => {
            let dir = default_data_dir()?;
            tokio::fs::create_dir_all(&dir).await?;
            dir
        }
    };
    let bundle = RemoteFetch::new(data_dir)
        .await?
        .latest_bundle(&TrustChannel::default(), SelectionPolicy::default())
        .await?;
    Ok(bundle.file_contents().await?)
}
