//! Ed25519 key generation and signing using aws-lc-rs
//!
//! The verifier never signs anything itself. Key pairs exist for tooling
//! that publishes bundles and for tests that need a throwaway trust anchor.

use crate::error::{Error, Result};
use crate::verification::{VerificationKey, ED25519_PUBLIC_KEY_LEN};
use aws_lc_rs::{
    rand::SystemRandom,
    signature::{Ed25519KeyPair, KeyPair as AwsKeyPair},
};

/// A detached signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature(Vec<u8>);

impl Signature {
    /// Create a new Signature from raw bytes
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Get the raw signature bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume and return the inner bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Encode the signature as lowercase hex, as stored in the catalog
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Encode the signature as base64url, as served by the transparency log
    pub fn to_base64url(&self) -> String {
        crate::encoding::base64url_encode(&self.0)
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// An Ed25519 signing key pair
pub struct KeyPair {
    inner: Ed25519KeyPair,
}

impl KeyPair {
    /// Generate a new Ed25519 key pair
    pub fn generate_ed25519() -> Result<Self> {
        let rng = SystemRandom::new();
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng)
            .map_err(|_| Error::KeyGeneration("failed to generate Ed25519 key".to_string()))?;
        let inner = Ed25519KeyPair::from_pkcs8(pkcs8.as_ref())?;
        Ok(Self { inner })
    }

    /// Get the raw public key bytes
    pub fn public_key_bytes(&self) -> &[u8] {
        self.inner.public_key().as_ref()
    }

    /// Get the public key for verification
    pub fn verification_key(&self) -> VerificationKey {
        let mut bytes = [0u8; ED25519_PUBLIC_KEY_LEN];
        bytes.copy_from_slice(self.public_key_bytes());
        VerificationKey::from_array(bytes)
    }

    /// Sign data
    pub fn sign(&self, data: &[u8]) -> Signature {
        Signature::new(self.inner.sign(data).as_ref().to_vec())
    }
}
