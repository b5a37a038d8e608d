//! Persisted catalog row

use crate::bundle::{BundleRecord, TrustChannel};
use crate::encoding::Hex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// One row of `ca-certs.json`
///
/// Rows lacking any of `date`, `file`, `sha256`, `signature` or
/// `trust-channel` do not parse; the catalog skips them instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Publication date, used for ordering
    pub date: String,
    /// Bundle filename, relative to the data directory
    pub file: String,
    /// Expected SHA-256 digest
    pub sha256: Hex,
    /// Expected Ed25519 signature
    pub signature: Hex,
    /// Trust channel name
    #[serde(rename = "trust-channel")]
    pub trust_channel: String,
    /// Custom validator tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<String>,
    /// Transparency log reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chronicle: Option<String>,
    /// Quarantine marker, normally the reason the bundle was marked bad
    ///
    /// Any JSON value is accepted; falsy values (`false`, `0`, `""`) leave
    /// the row selectable.
    #[serde(
        rename = "bad-bundle",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub bad_bundle: Option<Value>,
}

impl CatalogEntry {
    /// Parse a raw JSON row, returning `None` for incomplete or malformed rows
    pub fn from_row(row: &Value) -> Option<Self> {
        serde_json::from_value(row.clone()).ok()
    }

    /// Whether the row has been quarantined
    pub fn is_quarantined(&self) -> bool {
        match &self.bad_bundle {
            None | Some(Value::Null) => false,
            Some(Value::Bool(marked)) => *marked,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            Some(Value::String(reason)) => !reason.is_empty(),
            Some(Value::Array(_) | Value::Object(_)) => true,
        }
    }

    /// Build the bundle record for this row
    ///
    /// `custom_default` is used when the row names no custom validator.
    pub fn to_record(&self, data_dir: &Path, custom_default: Option<&str>) -> BundleRecord {
        let mut record = BundleRecord::new(
            data_dir.join(&self.file),
            self.sha256.clone(),
            self.signature.clone(),
        )
        .with_trust_channel(TrustChannel::new(self.trust_channel.clone()));
        if let Some(tag) = self.custom.as_deref().or(custom_default) {
            record = record.with_custom_validator(tag);
        }
        if let Some(hash) = &self.chronicle {
            record = record.with_chronicle_hash(hash.clone());
        }
        record
    }
}
