//! Catalog synchronization
//!
//! [`RemoteFetch`] keeps the local catalog and bundle files in step with a
//! remote source. A refresh rotates the previous catalog into a backup,
//! installs the fetched one, downloads bundles not yet on disk, and only
//! then records the synchronization time. A failed refresh leaves the cache
//! marker untouched so the next call retries.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use certainty_cache::CacheMarker;
use certainty_chronicle::Transport;
use certainty_types::{BundleRecord, TrustChannel};
use regex::Regex;
use serde_json::Value;
use url::Url;

use crate::catalog::{Catalog, CATALOG_FILE};
use crate::config::{RemoteConfig, SelectionPolicy, ValidatorConfig};
use crate::error::{Error, Result};
use crate::fetch::{CheckDefaults, Fetch};
use crate::http::bootstrap_transport;
use crate::validator::{BundleValidator, Validator};

/// Filenames the synchronization downloads
pub const ARTIFACT_PATTERN: &str = r"^cacert(-[0-9]{4}-[0-9]{2}-[0-9]{2})?\.pem$";

/// What a refresh changed on disk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Where the previous catalog was moved
    pub backup: Option<PathBuf>,
    /// Bundle files downloaded by this refresh
    pub downloaded: Vec<PathBuf>,
}

/// Selects verified bundles from a catalog synchronized with a remote source
///
/// Signature and transparency log checks are enforced by default. When a
/// policy leaves the log flag unset, only freshly downloaded bundles are
/// checked against the log.
#[derive(Clone)]
pub struct RemoteFetch {
    fetch: Fetch,
    remote: RemoteConfig,
    base: Url,
    transport: Arc<dyn Transport>,
    marker: CacheMarker,
    artifacts: Regex,
}

impl std::fmt::Debug for RemoteFetch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteFetch")
            .field("fetch", &self.fetch)
            .field("remote", &self.remote)
            .field("marker", &self.marker)
            .finish_non_exhaustive()
    }
}

impl RemoteFetch {
    /// Synchronize `data_dir` from the default source over a bootstrapped transport
    pub async fn new(data_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_config(data_dir, RemoteConfig::default()).await
    }

    /// Synchronize `data_dir` from `remote` over a bootstrapped transport
    pub async fn with_config(data_dir: impl Into<PathBuf>, remote: RemoteConfig) -> Result<Self> {
        let catalog = Catalog::open(data_dir).await?;
        let transport = bootstrap_transport(catalog.data_dir(), &remote.timeouts).await?;
        Self::with_transport(catalog, remote, transport)
    }

    /// Synchronize `catalog` from `remote` through `transport`
    ///
    /// The default validator reaches the transparency log through the same
    /// transport.
    pub fn with_transport(
        catalog: Catalog,
        remote: RemoteConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let mut url = remote.url.clone();
        if !url.ends_with('/') {
            url.push('/');
        }
        let base = Url::parse(&url)?;
        let artifacts =
            Regex::new(ARTIFACT_PATTERN).map_err(|e| Error::Config(e.to_string()))?;
        let marker = CacheMarker::new(catalog.data_dir()).with_ttl(remote.ttl);
        let fetch = Fetch::with_transport(catalog, transport.clone())
            .with_defaults(CheckDefaults {
                signature: true,
                chronicle: true,
            });
        Ok(Self {
            fetch,
            remote,
            base,
            transport,
            marker,
            artifacts,
        })
    }

    /// Verify untagged bundles with `validator`
    pub fn with_validator(mut self, validator: Arc<dyn BundleValidator>) -> Self {
        self.fetch = self.fetch.with_validator(validator);
        self
    }

    /// Verify untagged bundles under `config`, querying the log through this transport
    pub fn with_validator_config(self, config: ValidatorConfig) -> Self {
        let validator = Validator::with_transport(config, self.transport.clone());
        self.with_validator(Arc::new(validator))
    }

    /// Verify bundles tagged `tag` with `validator`
    pub fn add_validator(mut self, tag: impl Into<String>, validator: Arc<dyn BundleValidator>) -> Self {
        self.fetch = self.fetch.add_validator(tag, validator);
        self
    }

    /// The local selector
    pub fn fetch(&self) -> &Fetch {
        &self.fetch
    }

    /// The remote source configuration
    pub fn remote(&self) -> &RemoteConfig {
        &self.remote
    }

    /// The cache marker
    pub fn marker(&self) -> &CacheMarker {
        &self.marker
    }

    fn data_dir(&self) -> &Path {
        self.fetch.catalog().data_dir()
    }

    /// Whether the last synchronization is older than the TTL, or never happened
    pub async fn is_stale(&self) -> bool {
        self.marker.is_stale().await
    }

    /// Synchronize the catalog and bundle files with the remote source
    pub async fn refresh(&self) -> Result<RefreshReport> {
        let catalog_url = self.base.join(CATALOG_FILE)?;
        tracing::info!("Refreshing CA bundle catalog from {}", catalog_url);

        let body = self.download(&catalog_url).await?;
        let rows: Vec<Value> = serde_json::from_slice(&body)
            .map_err(|e| Error::Sync(format!("malformed remote catalog: {}", e)))?;

        let backup = self.fetch.catalog().replace(&rows).await?;

        let mut downloaded = Vec::new();
        for row in &rows {
            let Some(file) = row.get("file").and_then(Value::as_str) else {
                continue;
            };
            if !self.artifacts.is_match(file) {
                tracing::debug!("Ignoring catalog file name {:?}", file);
                continue;
            }
            let path = self.data_dir().join(file);
            if tokio::fs::try_exists(&path).await? {
                continue;
            }

            let contents = self.download(&self.base.join(file)?).await?;
            let partial = self.data_dir().join(format!("{}.part", file));
            tokio::fs::write(&partial, &contents).await?;
            tokio::fs::rename(&partial, &path).await?;
            tracing::debug!("Downloaded {}", path.display());

            self.fetch.mark_unverified(path.clone()).await;
            downloaded.push(path);
        }

        self.marker.touch().await?;
        tracing::info!(
            "Catalog refreshed, {} new bundle(s)",
            downloaded.len()
        );
        Ok(RefreshReport { backup, downloaded })
    }

    async fn download(&self, url: &Url) -> Result<Vec<u8>> {
        let response = self
            .transport
            .get(url.as_str())
            .await
            .and_then(|r| r.error_for_status(url.as_str()))
            .map_err(|e| Error::Sync(e.to_string()))?;
        Ok(response.body)
    }

    async fn ensure_fresh(&self) -> Result<()> {
        if self.is_stale().await {
            self.refresh().await?;
        }
        Ok(())
    }

    /// Bundle records of `channel`, newest first, refreshing first if stale
    pub async fn list_bundles(
        &self,
        custom_default: Option<&str>,
        channel: &TrustChannel,
    ) -> Result<Vec<BundleRecord>> {
        self.ensure_fresh().await?;
        self.fetch.list_bundles(custom_default, channel).await
    }

    /// Bundle records of every channel, newest first, refreshing first if stale
    pub async fn all_bundles(&self, custom_default: Option<&str>) -> Result<Vec<BundleRecord>> {
        self.ensure_fresh().await?;
        self.fetch.all_bundles(custom_default).await
    }

    /// Newest verified bundle of `channel`, refreshing first if stale
    pub async fn latest_bundle(
        &self,
        channel: &TrustChannel,
        policy: SelectionPolicy,
    ) -> Result<BundleRecord> {
        self.ensure_fresh().await?;
        self.fetch.latest_bundle(channel, policy).await
    }
}
