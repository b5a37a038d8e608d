//! Cryptographic primitives for Certainty
//!
//! This crate provides SHA-256 hashing, Ed25519 signature verification and
//! the trust anchor set, using aws-lc-rs as the cryptographic backend.

pub mod anchors;
pub mod encoding;
pub mod error;
pub mod hash;
pub mod signing;
pub mod verification;

pub use anchors::{AnchorSlot, TrustAnchors, BACKUP_SIGNING_PUBKEY, PRIMARY_SIGNING_PUBKEY};
pub use encoding::{base64url_decode, base64url_encode, constant_time_eq};
pub use error::{Error, Result};
pub use hash::{sha256, Sha256Hasher};
pub use signing::{KeyPair, Signature};
pub use verification::VerificationKey;
