//! Configuration for validators, selection and synchronization

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use certainty_cache::DEFAULT_CACHE_TTL;
use certainty_chronicle::{
    ChronicleClient, Strictness, Transport, CHRONICLE_KEY, CHRONICLE_URL,
};
use certainty_crypto::{TrustAnchors, VerificationKey};

use crate::error::{Error, Result};

/// Repository identifier that transparency log records must name
pub const DEFAULT_REPOSITORY: &str = "paragonie/certainty";

/// Where published catalogs and bundles are downloaded from
pub const DEFAULT_REMOTE_URL: &str =
    "https://raw.githubusercontent.com/paragonie/certainty/master/data/";

/// Default connect timeout for HTTP clients
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default overall request timeout for HTTP clients
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where and how to reach a Chronicle instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChronicleConfig {
    /// Base URL of the instance
    pub url: String,
    /// Key the instance signs its responses with
    pub public_key: VerificationKey,
}

impl Default for ChronicleConfig {
    fn default() -> Self {
        Self {
            url: CHRONICLE_URL.to_string(),
            public_key: CHRONICLE_KEY,
        }
    }
}

impl ChronicleConfig {
    /// Configure a custom instance
    pub fn new(url: impl Into<String>, public_key: VerificationKey) -> Self {
        Self {
            url: url.into(),
            public_key,
        }
    }

    /// Configure a custom instance from a base64url encoded key
    pub fn from_base64url(url: impl Into<String>, public_key: &str) -> Result<Self> {
        Ok(Self::new(url, VerificationKey::from_base64url(public_key)?))
    }

    /// Build a client that issues requests through `transport`
    pub fn client(&self, transport: Arc<dyn Transport>) -> ChronicleClient {
        ChronicleClient::new(self.url.clone(), self.public_key, transport)
    }
}

/// Trust configuration for one validator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorConfig {
    /// Keys bundle signatures and log records are checked against
    pub anchors: TrustAnchors,
    /// Transparency log to cross-check against
    ///
    /// `None` opts out of the log entirely and makes the log check pass.
    pub chronicle: Option<ChronicleConfig>,
    /// Repository identifier log records must mention
    pub repository: String,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            anchors: TrustAnchors::embedded(),
            chronicle: Some(ChronicleConfig::default()),
            repository: DEFAULT_REPOSITORY.to_string(),
        }
    }
}

impl ValidatorConfig {
    /// Check signatures against different anchors
    pub fn with_anchors(mut self, anchors: TrustAnchors) -> Self {
        self.anchors = anchors;
        self
    }

    /// Cross-check against a different Chronicle instance
    pub fn with_chronicle(mut self, chronicle: ChronicleConfig) -> Self {
        self.chronicle = Some(chronicle);
        self
    }

    /// Skip the transparency log
    pub fn without_chronicle(mut self) -> Self {
        self.chronicle = None;
        self
    }

    /// Expect a different repository identifier in log records
    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = repository.into();
        self
    }
}

/// Which checks a selection run enforces
///
/// Unset flags fall back to the orchestrator's defaults. An unset log flag on
/// a remote orchestrator enforces the log check only for freshly downloaded
/// bundles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPolicy {
    /// Require a valid Ed25519 signature
    pub check_signature: Option<bool>,
    /// Require a transparency log attestation
    pub check_chronicle: Option<bool>,
    /// How an unsigned log response is reported
    pub strictness: Strictness,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            check_signature: None,
            check_chronicle: None,
            strictness: Strictness::Strict,
        }
    }
}

impl SelectionPolicy {
    /// Enforce every check unconditionally
    pub fn strict() -> Self {
        Self::default()
            .require_signature(true)
            .require_chronicle(true)
    }

    /// Only compare digests
    pub fn digest_only() -> Self {
        Self::default()
            .require_signature(false)
            .require_chronicle(false)
    }

    /// Set whether the signature check is enforced
    pub fn require_signature(mut self, enabled: bool) -> Self {
        self.check_signature = Some(enabled);
        self
    }

    /// Set whether the transparency log check is enforced
    pub fn require_chronicle(mut self, enabled: bool) -> Self {
        self.check_chronicle = Some(enabled);
        self
    }

    /// Report unsigned log responses as `strictness` dictates
    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }
}

/// HTTP timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Connect timeout
    pub connect: Duration,
    /// Overall request timeout, `None` for no limit
    pub request: Option<Duration>,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: DEFAULT_CONNECT_TIMEOUT,
            request: Some(DEFAULT_REQUEST_TIMEOUT),
        }
    }
}

/// Remote source configuration for catalog synchronization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Base URL serving `ca-certs.json` and the bundle files
    pub url: String,
    /// How long a synchronization stays fresh
    pub ttl: Duration,
    /// HTTP timeouts
    pub timeouts: Timeouts,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_REMOTE_URL.to_string(),
            ttl: DEFAULT_CACHE_TTL,
            timeouts: Timeouts::default(),
        }
    }
}

impl RemoteConfig {
    /// Synchronize from a different source
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Use a different cache lifetime
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Use different HTTP timeouts
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }
}

/// Platform data directory for cached catalogs and bundles
pub fn default_data_dir() -> Result<PathBuf> {
    directories::ProjectDirs::from("com", "paragonie", "certainty")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| Error::Config("no home directory to derive a data directory from".into()))
}
