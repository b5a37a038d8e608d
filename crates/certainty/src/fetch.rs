//! Bundle selection
//!
//! [`Fetch`] walks the catalog newest first and returns the first bundle that
//! passes every enforced check. Each rejected bundle is quarantined in the
//! catalog so later runs skip it.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use certainty_chronicle::Transport;
use certainty_types::{BundleRecord, TrustChannel};
use tokio::sync::Mutex;

use crate::catalog::{Candidate, Catalog};
use crate::config::{SelectionPolicy, Timeouts, ValidatorConfig};
use crate::error::{Error, Result};
use crate::http::bootstrap_transport;
use crate::validator::{BundleValidator, Validator};

/// Quarantine reason for a digest mismatch
pub const REASON_SHA256: &str = "SHA256 mismatch";
/// Quarantine reason for a signature mismatch
pub const REASON_SIGNATURE: &str = "Ed25519 signature mismatch";
/// Quarantine reason for a missing transparency log attestation
pub const REASON_CHRONICLE: &str = "Chronicle";

/// Checks enforced when a [`SelectionPolicy`] leaves a flag unset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CheckDefaults {
    /// Enforce the signature check
    pub signature: bool,
    /// Enforce the transparency log check
    pub chronicle: bool,
}

/// Selects the newest verified bundle from a local catalog
#[derive(Clone)]
pub struct Fetch {
    catalog: Catalog,
    validator: Arc<dyn BundleValidator>,
    custom: HashMap<String, Arc<dyn BundleValidator>>,
    defaults: CheckDefaults,
    unverified: Arc<Mutex<HashSet<PathBuf>>>,
}

impl std::fmt::Debug for Fetch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetch")
            .field("catalog", &self.catalog)
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl Fetch {
    /// Select from `catalog`, enforcing only the digest check by default
    ///
    /// The default validator reaches the log over HTTPS trusting the
    /// embedded roots.
    pub fn new(catalog: Catalog) -> Result<Self> {
        let validator = Validator::new(ValidatorConfig::default())?;
        Ok(Self::with_default_validator(catalog, Arc::new(validator)))
    }

    /// Select from `catalog`, reaching the log through `transport`
    pub fn with_transport(catalog: Catalog, transport: Arc<dyn Transport>) -> Self {
        let validator = Validator::with_transport(ValidatorConfig::default(), transport);
        Self::with_default_validator(catalog, Arc::new(validator))
    }

    /// Select from `catalog`, reaching the log over TLS anchored in the newest local bundle
    pub async fn bootstrap(catalog: Catalog, timeouts: &Timeouts) -> Result<Self> {
        let transport = bootstrap_transport(catalog.data_dir(), timeouts).await?;
        Ok(Self::with_transport(catalog, transport))
    }

    fn with_default_validator(catalog: Catalog, validator: Arc<dyn BundleValidator>) -> Self {
        Self {
            catalog,
            validator,
            custom: HashMap::new(),
            defaults: CheckDefaults::default(),
            unverified: Arc::default(),
        }
    }

    /// Verify bundles without a registered custom tag with `validator`
    pub fn with_validator(mut self, validator: Arc<dyn BundleValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Verify bundles tagged `tag` with `validator`
    pub fn add_validator(mut self, tag: impl Into<String>, validator: Arc<dyn BundleValidator>) -> Self {
        self.custom.insert(tag.into(), validator);
        self
    }

    /// Change the checks enforced for unset policy flags
    pub fn with_defaults(mut self, defaults: CheckDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// The underlying catalog
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Checks enforced for unset policy flags
    pub fn defaults(&self) -> CheckDefaults {
        self.defaults
    }

    /// Require a log attestation for `path` the next time it is selected
    pub async fn mark_unverified(&self, path: impl Into<PathBuf>) {
        self.unverified.lock().await.insert(path.into());
    }

    /// Whether `path` still awaits its first log attestation
    pub async fn is_unverified(&self, path: &Path) -> bool {
        self.unverified.lock().await.contains(path)
    }

    /// Bundle records of `channel`, newest first
    ///
    /// Rows without a custom validator tag take `custom_default`.
    pub async fn list_bundles(
        &self,
        custom_default: Option<&str>,
        channel: &TrustChannel,
    ) -> Result<Vec<BundleRecord>> {
        let candidates = self.catalog.load(channel).await?;
        Ok(self.records(&candidates, custom_default))
    }

    /// Bundle records of every channel, newest first
    pub async fn all_bundles(&self, custom_default: Option<&str>) -> Result<Vec<BundleRecord>> {
        let candidates = self.catalog.load_all().await?;
        Ok(self.records(&candidates, custom_default))
    }

    fn records(&self, candidates: &[Candidate], custom_default: Option<&str>) -> Vec<BundleRecord> {
        candidates
            .iter()
            .map(|c| c.entry.to_record(self.catalog.data_dir(), custom_default))
            .collect()
    }

    fn validator_for(&self, bundle: &BundleRecord) -> &dyn BundleValidator {
        match bundle.custom_validator() {
            Some(tag) => match self.custom.get(tag) {
                Some(validator) => validator.as_ref(),
                None => {
                    tracing::debug!("No validator registered for {:?}, using default", tag);
                    self.validator.as_ref()
                }
            },
            None => self.validator.as_ref(),
        }
    }

    /// Newest bundle of `channel` that passes every check `policy` enforces
    ///
    /// Fails with [`Error::NoValidBundle`] once every candidate is rejected.
    pub async fn latest_bundle(
        &self,
        channel: &TrustChannel,
        policy: SelectionPolicy,
    ) -> Result<BundleRecord> {
        let check_signature = policy.check_signature.unwrap_or(self.defaults.signature);
        let check_chronicle = policy.check_chronicle.unwrap_or(self.defaults.chronicle);
        let conditional = policy.check_chronicle.is_none();

        for candidate in self.catalog.load(channel).await? {
            let bundle = candidate.entry.to_record(self.catalog.data_dir(), None);
            let validator = self.validator_for(&bundle);

            if !validator.check_sha256_sum(&bundle).await? {
                self.reject(&candidate, &bundle, REASON_SHA256).await?;
                continue;
            }
            if check_signature && !validator.check_signature_any(&bundle).await? {
                self.reject(&candidate, &bundle, REASON_SIGNATURE).await?;
                continue;
            }
            if check_chronicle
                && (!conditional || self.is_unverified(bundle.file_path()).await)
            {
                if !validator
                    .check_chronicle_hash(&bundle, policy.strictness)
                    .await?
                {
                    self.reject(&candidate, &bundle, REASON_CHRONICLE).await?;
                    continue;
                }
                self.unverified.lock().await.remove(bundle.file_path());
            }

            tracing::info!(
                "Selected CA bundle {} ({})",
                bundle.file_path().display(),
                candidate.entry.date
            );
            return Ok(bundle);
        }
        Err(Error::NoValidBundle)
    }

    async fn reject(&self, candidate: &Candidate, bundle: &BundleRecord, reason: &str) -> Result<()> {
        tracing::warn!("Rejecting {}: {}", bundle.file_path().display(), reason);
        self.catalog.quarantine(candidate.index, reason).await
    }
}
