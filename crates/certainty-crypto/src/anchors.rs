//! Trust anchors
//!
//! The two Ed25519 public keys that bundle signatures and transparency log
//! records are checked against. A primary and a backup key are held so the
//! signer can rotate without invalidating the catalog.

use crate::encoding::constant_time_eq;
use crate::error::Result;
use crate::verification::VerificationKey;

/// Primary signing key for published CA bundles (hex)
pub const PRIMARY_SIGNING_PUBKEY: &str =
    "98f2dfad4115fea9f096c35485b3bf20b06e94acac3b7acf6185aa5806020342";

/// Backup signing key for published CA bundles (hex)
pub const BACKUP_SIGNING_PUBKEY: &str =
    "1cb438a66110689f1192b511a88030f02049c40d196dc1844f9e752531fdd195";

const PRIMARY_SIGNING_KEY_BYTES: [u8; 32] = [
    0x98, 0xf2, 0xdf, 0xad, 0x41, 0x15, 0xfe, 0xa9, 0xf0, 0x96, 0xc3, 0x54, 0x85, 0xb3, 0xbf, 0x20,
    0xb0, 0x6e, 0x94, 0xac, 0xac, 0x3b, 0x7a, 0xcf, 0x61, 0x85, 0xaa, 0x58, 0x06, 0x02, 0x03, 0x42,
];

const BACKUP_SIGNING_KEY_BYTES: [u8; 32] = [
    0x1c, 0xb4, 0x38, 0xa6, 0x61, 0x10, 0x68, 0x9f, 0x11, 0x92, 0xb5, 0x11, 0xa8, 0x80, 0x30, 0xf0,
    0x20, 0x49, 0xc4, 0x0d, 0x19, 0x6d, 0xc1, 0x84, 0x4f, 0x9e, 0x75, 0x25, 0x31, 0xfd, 0xd1, 0x95,
];

/// Which trust anchor to check a signature against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnchorSlot {
    /// The primary signing key
    #[default]
    Primary,
    /// The backup signing key
    Backup,
}

/// The primary and backup trust anchors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustAnchors {
    primary: VerificationKey,
    backup: VerificationKey,
}

impl TrustAnchors {
    /// Create an anchor set from two keys
    pub fn new(primary: VerificationKey, backup: VerificationKey) -> Self {
        Self { primary, backup }
    }

    /// Create an anchor set from two hex-encoded keys
    pub fn from_hex(primary: &str, backup: &str) -> Result<Self> {
        Ok(Self::new(
            VerificationKey::from_hex(primary)?,
            VerificationKey::from_hex(backup)?,
        ))
    }

    /// The anchors embedded in this crate
    pub fn embedded() -> Self {
        Self::new(
            VerificationKey::from_array(PRIMARY_SIGNING_KEY_BYTES),
            VerificationKey::from_array(BACKUP_SIGNING_KEY_BYTES),
        )
    }

    /// Get the key in a slot
    pub fn key(&self, slot: AnchorSlot) -> &VerificationKey {
        match slot {
            AnchorSlot::Primary => &self.primary,
            AnchorSlot::Backup => &self.backup,
        }
    }

    /// Whether raw key bytes match either anchor, compared in constant time
    pub fn contains(&self, public_key: &[u8]) -> bool {
        let primary = constant_time_eq(public_key, self.primary.as_bytes());
        let backup = constant_time_eq(public_key, self.backup.as_bytes());
        primary | backup
    }
}

impl Default for TrustAnchors {
    fn default() -> Self {
        Self::embedded()
    }
}
