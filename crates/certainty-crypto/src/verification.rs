//! Signature verification using aws-lc-rs

use crate::error::{Error, Result};
use aws_lc_rs::signature::{UnparsedPublicKey, ED25519};

/// Length of a raw Ed25519 public key
pub const ED25519_PUBLIC_KEY_LEN: usize = 32;

/// An Ed25519 public key for verification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationKey {
    bytes: [u8; ED25519_PUBLIC_KEY_LEN],
}

impl VerificationKey {
    /// Create a verification key from raw key bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; ED25519_PUBLIC_KEY_LEN] = bytes.try_into().map_err(|_| {
            Error::InvalidKeyFormat(format!(
                "Ed25519 public key must be {} bytes, got {}",
                ED25519_PUBLIC_KEY_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self { bytes })
    }

    /// Create a verification key from a fixed-size key
    pub const fn from_array(bytes: [u8; ED25519_PUBLIC_KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Create a verification key from a hex-encoded public key
    pub fn from_hex(s: &str) -> Result<Self> {
        Self::from_bytes(&hex::decode(s)?)
    }

    /// Create a verification key from a base64url-encoded public key
    pub fn from_base64url(s: &str) -> Result<Self> {
        Self::from_bytes(&crate::encoding::base64url_decode(s)?)
    }

    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Verify a detached signature over data
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> Result<()> {
        UnparsedPublicKey::new(&ED25519, &self.bytes)
            .verify(data, signature)
            .map_err(|_| Error::Verification("Ed25519 signature invalid".to_string()))
    }

    /// Verify a detached signature, mapping a mismatch to `false`
    pub fn is_valid(&self, data: &[u8], signature: &[u8]) -> bool {
        self.verify(data, signature).is_ok()
    }
}
