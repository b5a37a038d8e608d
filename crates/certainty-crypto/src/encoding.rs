//! Encoding and comparison helpers

use base64::alphabet::URL_SAFE;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use subtle::ConstantTimeEq;

/// base64url engine that accepts input with or without padding
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode base64url data, padded or not
pub fn base64url_decode(input: &str) -> crate::Result<Vec<u8>> {
    Ok(URL_SAFE_LENIENT.decode(input.trim())?)
}

/// Encode data as padded base64url
pub fn base64url_encode(input: &[u8]) -> String {
    URL_SAFE_LENIENT.encode(input)
}

/// Compare two byte strings in constant time
///
/// Slices of different lengths compare unequal.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    bool::from(a.ct_eq(b))
}
