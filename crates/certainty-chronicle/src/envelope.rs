//! Signed response envelopes
//!
//! Chronicle signs every response body with its own Ed25519 key and sends
//! the base64url signature in one or more `Body-Signature-Ed25519` headers.
//! Nothing inside a response is trusted until one of those signatures
//! verifies over the raw body.

use certainty_crypto::{base64url_decode, VerificationKey};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::transport::HttpResponse;

/// Header carrying the body signature
pub const BODY_SIGNATURE_HEADER: &str = "Body-Signature-Ed25519";

/// Whether any envelope signature on `response` verifies under `key`
pub fn verify_envelope(response: &HttpResponse, key: &VerificationKey) -> bool {
    response
        .header_values(BODY_SIGNATURE_HEADER)
        .filter_map(|value| base64url_decode(value).ok())
        .any(|signature| key.is_valid(&response.body, &signature))
}

/// Verify the envelope, then decode the body as JSON
pub fn decode_signed_json<T: DeserializeOwned>(
    response: &HttpResponse,
    key: &VerificationKey,
) -> Result<T> {
    if !verify_envelope(response, key) {
        return Err(Error::InvalidEnvelope);
    }
    Ok(serde_json::from_slice(&response.body)?)
}
