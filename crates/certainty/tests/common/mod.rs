//! Shared fixtures for integration tests
//!
//! Every test gets a scratch data directory, freshly generated trust anchors
//! and Chronicle key, and an in-memory transport standing in for both the
//! remote mirror and the transparency log.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use certainty::chronicle::{HttpResponse, MemoryTransport, BODY_SIGNATURE_HEADER};
use certainty::crypto::{base64url_encode, sha256, KeyPair, TrustAnchors};
use certainty::types::Hex;
use certainty::{
    BundleValidator, Catalog, ChronicleConfig, Fetch, RemoteConfig, RemoteFetch, Validator,
    ValidatorConfig, CATALOG_FILE,
};
use serde_json::{json, Value};

pub const LOG_URL: &str = "https://chronicle.test/chronicle";
pub const REMOTE_URL: &str = "https://mirror.test/data/";

pub struct Harness {
    pub dir: tempfile::TempDir,
    pub primary: KeyPair,
    pub backup: KeyPair,
    pub log_key: KeyPair,
    pub transport: Arc<MemoryTransport>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            primary: KeyPair::generate_ed25519().unwrap(),
            backup: KeyPair::generate_ed25519().unwrap(),
            log_key: KeyPair::generate_ed25519().unwrap(),
            transport: Arc::new(MemoryTransport::new()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.path().join(file)
    }

    pub fn anchors(&self) -> TrustAnchors {
        TrustAnchors::new(self.primary.verification_key(), self.backup.verification_key())
    }

    pub fn validator_config(&self) -> ValidatorConfig {
        ValidatorConfig::default()
            .with_anchors(self.anchors())
            .with_chronicle(ChronicleConfig::new(LOG_URL, self.log_key.verification_key()))
    }

    pub fn validator(&self) -> Arc<dyn BundleValidator> {
        Arc::new(Validator::with_transport(
            self.validator_config(),
            self.transport.clone(),
        ))
    }

    /// Local selector using this harness's anchors and log
    pub fn fetch(&self) -> Fetch {
        Fetch::with_transport(Catalog::new(self.data_dir()), self.transport.clone())
            .with_validator(self.validator())
    }

    /// Synchronizing selector reading from [`REMOTE_URL`]
    pub fn remote(&self) -> RemoteFetch {
        RemoteFetch::with_transport(
            Catalog::new(self.data_dir()),
            RemoteConfig::default().with_url(REMOTE_URL),
            self.transport.clone(),
        )
        .unwrap()
        .with_validator_config(self.validator_config())
    }

    /// Catalog row for `contents` signed by `signer`, with log reference `ref-<file>`
    pub fn row(&self, date: &str, file: &str, contents: &[u8], signer: &KeyPair) -> Value {
        json!({
            "date": date,
            "file": file,
            "sha256": Hex::encode(&sha256(contents)),
            "signature": signer.sign(contents).to_hex(),
            "trust-channel": "Mozilla",
            "chronicle": format!("ref-{}", file),
        })
    }

    pub async fn write_bundle(&self, file: &str, contents: &[u8]) {
        tokio::fs::write(self.path(file), contents).await.unwrap();
    }

    pub async fn write_catalog(&self, rows: &[Value]) {
        tokio::fs::write(self.path(CATALOG_FILE), serde_json::to_vec_pretty(rows).unwrap())
            .await
            .unwrap();
    }

    pub async fn read_rows(&self) -> Vec<Value> {
        let bytes = tokio::fs::read(self.path(CATALOG_FILE)).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Sign `records` as a Chronicle lookup response for `reference`
    pub async fn publish_records(&self, reference: &str, records: Vec<Value>) {
        let body = json!({ "version": "1.0", "status": "OK", "results": records }).to_string();
        let response = HttpResponse::ok(body.clone()).with_header(
            BODY_SIGNATURE_HEADER,
            self.log_key.sign(body.as_bytes()).to_base64url(),
        );
        self.transport
            .insert(lookup_url(reference), response)
            .await;
    }

    /// Publish a valid attestation of `row` signed by the primary anchor
    pub async fn publish(&self, row: &Value) {
        let record = self.record(&self.primary, &attestation(row));
        self.publish_records(row["chronicle"].as_str().unwrap(), vec![record])
            .await;
    }

    pub fn record(&self, signer: &KeyPair, contents: &str) -> Value {
        json!({
            "contents": contents,
            "signature": signer.sign(contents.as_bytes()).to_base64url(),
            "publickey": base64url_encode(signer.public_key_bytes()),
        })
    }

    /// Serve `rows` as the remote catalog and `files` as remote bundles
    pub async fn serve_remote(&self, rows: &[Value], files: &[(&str, &[u8])]) {
        self.transport
            .insert(
                format!("{}{}", REMOTE_URL, CATALOG_FILE),
                HttpResponse::ok(serde_json::to_vec(rows).unwrap()),
            )
            .await;
        for (file, contents) in files {
            self.transport
                .insert(format!("{}{}", REMOTE_URL, file), HttpResponse::ok(contents.to_vec()))
                .await;
        }
    }

    pub async fn lookups(&self) -> usize {
        self.transport
            .requests()
            .await
            .iter()
            .filter(|url| url.starts_with(LOG_URL))
            .count()
    }

    pub async fn downloads(&self) -> Vec<String> {
        self.transport
            .requests()
            .await
            .into_iter()
            .filter(|url| url.starts_with(REMOTE_URL) && !url.ends_with(CATALOG_FILE))
            .collect()
    }
}

pub fn lookup_url(reference: &str) -> String {
    format!("{}/lookup/{}", LOG_URL, reference)
}

/// Record contents attesting to `row`, with the repository slash escaped
pub fn attestation(row: &Value) -> String {
    format!(
        r#"{{"repository":"paragonie\/certainty","sha256":"{}","file":"{}"}}"#,
        row["sha256"].as_str().unwrap(),
        row["file"].as_str().unwrap()
    )
}

pub fn quarantine_reason(row: &Value) -> Option<&str> {
    row.get("bad-bundle").and_then(Value::as_str)
}
