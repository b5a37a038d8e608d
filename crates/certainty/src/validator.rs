//! Bundle verification
//!
//! A [`BundleValidator`] answers three independent questions about a
//! [`BundleRecord`]: does the file hash to the expected digest, is the
//! expected signature valid under a trust anchor, and does the transparency
//! log hold an attestation for it. Mismatches are `Ok(false)`; errors are
//! reserved for problems that prevent a check from being evaluated.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use certainty_chronicle::{ChronicleClient, HttpTransport, RecordExpectation, Strictness, Transport};
use certainty_crypto::{constant_time_eq, AnchorSlot, Sha256Hasher};
use certainty_types::BundleRecord;
use tokio::io::AsyncReadExt;

use crate::config::{Timeouts, ValidatorConfig};
use crate::error::Result;
use crate::http::http_client;

/// Read size used while hashing bundle files
pub const CHUNK_SIZE: usize = 16384;

/// Boxed future returned by validator checks
pub type CheckFuture<'a> = Pin<Box<dyn Future<Output = Result<bool>> + Send + 'a>>;

/// Checks that establish a bundle's authenticity
///
/// Implementations can substitute different anchors or logs; the
/// orchestrator picks one per bundle by its custom validator tag.
pub trait BundleValidator: Send + Sync {
    /// Whether the file's SHA-256 digest equals the expected digest
    fn check_sha256_sum<'a>(&'a self, bundle: &'a BundleRecord) -> CheckFuture<'a>;

    /// Whether the expected signature is valid under the anchor in `slot`
    fn check_ed25519_signature<'a>(
        &'a self,
        bundle: &'a BundleRecord,
        slot: AnchorSlot,
    ) -> CheckFuture<'a>;

    /// Whether the transparency log attests to the bundle
    fn check_chronicle_hash<'a>(
        &'a self,
        bundle: &'a BundleRecord,
        strictness: Strictness,
    ) -> CheckFuture<'a>;

    /// Whether the signature is valid under the primary or else the backup anchor
    fn check_signature_any<'a>(&'a self, bundle: &'a BundleRecord) -> CheckFuture<'a> {
        Box::pin(async move {
            if self.check_ed25519_signature(bundle, AnchorSlot::Primary).await? {
                return Ok(true);
            }
            self.check_ed25519_signature(bundle, AnchorSlot::Backup).await
        })
    }

    /// Run every check, stopping at the first failure
    fn verify<'a>(&'a self, bundle: &'a BundleRecord, strictness: Strictness) -> CheckFuture<'a> {
        Box::pin(async move {
            Ok(self.check_sha256_sum(bundle).await?
                && self.check_signature_any(bundle).await?
                && self.check_chronicle_hash(bundle, strictness).await?)
        })
    }
}

/// The standard validator
#[derive(Debug, Clone)]
pub struct Validator {
    config: ValidatorConfig,
    chronicle: Option<ChronicleClient>,
}

impl Validator {
    /// Create a validator that reaches the log over HTTPS trusting the embedded roots
    pub fn new(config: ValidatorConfig) -> Result<Self> {
        let client = http_client(None, &Timeouts::default())?;
        Ok(Self::with_transport(config, Arc::new(HttpTransport::new(client))))
    }

    /// Create a validator that reaches the log through `transport`
    pub fn with_transport(config: ValidatorConfig, transport: Arc<dyn Transport>) -> Self {
        let chronicle = config
            .chronicle
            .as_ref()
            .map(|chronicle| chronicle.client(transport));
        Self { config, chronicle }
    }

    /// The trust configuration
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }
}

impl BundleValidator for Validator {
    fn check_sha256_sum<'a>(&'a self, bundle: &'a BundleRecord) -> CheckFuture<'a> {
        Box::pin(async move {
            let expected = match bundle.sha256_sum_raw() {
                Ok(expected) => expected,
                Err(e) => {
                    tracing::warn!("Undecodable digest for {}: {}", bundle.file_path().display(), e);
                    return Ok(false);
                }
            };

            let mut file = tokio::fs::File::open(bundle.file_path()).await?;
            let mut hasher = Sha256Hasher::new();
            let mut buf = vec![0u8; CHUNK_SIZE];
            loop {
                let n = file.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
            }
            Ok(constant_time_eq(&hasher.finalize(), &expected))
        })
    }

    fn check_ed25519_signature<'a>(
        &'a self,
        bundle: &'a BundleRecord,
        slot: AnchorSlot,
    ) -> CheckFuture<'a> {
        Box::pin(async move {
            let signature = match bundle.signature_raw() {
                Ok(signature) => signature,
                Err(e) => {
                    tracing::warn!(
                        "Undecodable signature for {}: {}",
                        bundle.file_path().display(),
                        e
                    );
                    return Ok(false);
                }
            };
            let contents = bundle.file_contents().await?;
            Ok(self.config.anchors.key(slot).is_valid(&contents, &signature))
        })
    }

    fn check_chronicle_hash<'a>(
        &'a self,
        bundle: &'a BundleRecord,
        strictness: Strictness,
    ) -> CheckFuture<'a> {
        Box::pin(async move {
            let Some(client) = &self.chronicle else {
                return Ok(true);
            };
            let Some(hash) = bundle.chronicle_hash() else {
                tracing::debug!(
                    "No Chronicle reference for {}",
                    bundle.file_path().display()
                );
                return Ok(false);
            };
            let expect = RecordExpectation {
                digest: bundle.sha256_sum().as_str(),
                repository: &self.config.repository,
                anchors: &self.config.anchors,
            };
            Ok(client.attests(hash, &expect, strictness).await?)
        })
    }
}
