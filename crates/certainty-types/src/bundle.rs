//! Bundle record and trust channel types
//!
//! A [`BundleRecord`] describes one candidate CA bundle file together with
//! the trust metadata needed to prove it authentic. Records are immutable;
//! a rejected bundle is tracked by the catalog, never by mutating the record.

use crate::encoding::Hex;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the trust channel used when none is given
pub const DEFAULT_TRUST_CHANNEL: &str = "Mozilla";

/// A named partition of the catalog representing an independent trust domain
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrustChannel(String);

impl TrustChannel {
    /// Create a trust channel; an empty name selects the default channel
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        if name.is_empty() {
            Self::default()
        } else {
            TrustChannel(name)
        }
    }

    /// Get the channel name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TrustChannel {
    fn default() -> Self {
        TrustChannel(DEFAULT_TRUST_CHANNEL.to_string())
    }
}

impl From<&str> for TrustChannel {
    fn from(name: &str) -> Self {
        TrustChannel::new(name)
    }
}

impl From<String> for TrustChannel {
    fn from(name: String) -> Self {
        TrustChannel::new(name)
    }
}

impl PartialEq<str> for TrustChannel {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl std::fmt::Display for TrustChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One candidate CA bundle and its expected trust metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleRecord {
    path: PathBuf,
    sha256: Hex,
    signature: Hex,
    custom_validator: Option<String>,
    chronicle_hash: Option<String>,
    trust_channel: TrustChannel,
}

impl BundleRecord {
    /// Create a record for the bundle at `path` in the default trust channel
    pub fn new(path: impl Into<PathBuf>, sha256: impl Into<Hex>, signature: impl Into<Hex>) -> Self {
        Self {
            path: path.into(),
            sha256: sha256.into(),
            signature: signature.into(),
            custom_validator: None,
            chronicle_hash: None,
            trust_channel: TrustChannel::default(),
        }
    }

    /// Select a custom validator by tag; empty tags are ignored
    pub fn with_custom_validator(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        self.custom_validator = (!tag.is_empty()).then_some(tag);
        self
    }

    /// Attach a transparency log reference; empty references are ignored
    pub fn with_chronicle_hash(mut self, hash: impl Into<String>) -> Self {
        let hash = hash.into();
        self.chronicle_hash = (!hash.is_empty()).then_some(hash);
        self
    }

    /// Place the record in a trust channel
    pub fn with_trust_channel(mut self, channel: impl Into<TrustChannel>) -> Self {
        self.trust_channel = channel.into();
        self
    }

    /// Location of the bundle file
    pub fn file_path(&self) -> &Path {
        &self.path
    }

    /// Expected SHA-256 digest, hex-encoded
    pub fn sha256_sum(&self) -> &Hex {
        &self.sha256
    }

    /// Expected SHA-256 digest as raw bytes
    pub fn sha256_sum_raw(&self) -> Result<Vec<u8>> {
        self.sha256.decode()
    }

    /// Expected detached Ed25519 signature, hex-encoded
    pub fn signature(&self) -> &Hex {
        &self.signature
    }

    /// Expected detached Ed25519 signature as raw bytes
    pub fn signature_raw(&self) -> Result<Vec<u8>> {
        self.signature.decode()
    }

    /// Tag of the custom validator this record asks for, if any
    pub fn custom_validator(&self) -> Option<&str> {
        self.custom_validator.as_deref()
    }

    /// Whether the record asks for a custom validator
    pub fn has_custom(&self) -> bool {
        self.custom_validator.is_some()
    }

    /// Transparency log reference, if any
    pub fn chronicle_hash(&self) -> Option<&str> {
        self.chronicle_hash.as_deref()
    }

    /// Trust channel this record belongs to
    pub fn trust_channel(&self) -> &TrustChannel {
        &self.trust_channel
    }

    /// Read the bundle file
    pub async fn file_contents(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }
}
