//! Chronicle client for transparency log lookups

use std::sync::Arc;

use certainty_crypto::VerificationKey;
use url::Url;

use crate::entry::{LookupResponse, RecordExpectation, Strictness};
use crate::envelope::decode_signed_json;
use crate::error::{Error, Result};
use crate::transport::Transport;

/// Public Chronicle instance that records Certainty bundle releases
pub const CHRONICLE_URL: &str = "https://php-chronicle.pie-hosted.com/chronicle";

/// base64url Ed25519 key of [`CHRONICLE_URL`]
pub const CHRONICLE_PUBKEY: &str = "Bgcc1QfkP0UNgMZuHzi0hC1hA1SoVAyUrskmSkzRw3E=";

const CHRONICLE_KEY_BYTES: [u8; 32] = [
    6, 7, 28, 213, 7, 228, 63, 69, 13, 128, 198, 110, 31, 56, 180, 132, 45, 97, 3, 84, 168, 84,
    12, 148, 174, 201, 38, 74, 76, 209, 195, 113,
];

/// Key of the public instance, decoded from [`CHRONICLE_PUBKEY`]
pub const CHRONICLE_KEY: VerificationKey = VerificationKey::from_array(CHRONICLE_KEY_BYTES);

/// A client for querying a Chronicle instance
#[derive(Clone)]
pub struct ChronicleClient {
    /// Base URL, without trailing slash
    url: String,
    /// Key the instance signs its responses with
    public_key: VerificationKey,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for ChronicleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChronicleClient")
            .field("url", &self.url)
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

impl ChronicleClient {
    /// Create a client for `url` whose responses must be signed by `public_key`
    ///
    /// Requests go through `transport`, which carries the TLS policy.
    pub fn new(
        url: impl Into<String>,
        public_key: VerificationKey,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let url = url.into().trim_end_matches('/').to_string();
        Self {
            url,
            public_key,
            transport,
        }
    }

    /// Create a client from a base64url encoded public key
    pub fn from_base64url(
        url: impl Into<String>,
        public_key: &str,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        Ok(Self::new(
            url,
            VerificationKey::from_base64url(public_key)?,
            transport,
        ))
    }

    /// Create a client for the public instance
    pub fn public(transport: Arc<dyn Transport>) -> Self {
        Self::new(CHRONICLE_URL, CHRONICLE_KEY, transport)
    }

    /// Base URL of the instance
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Key the instance signs its responses with
    pub fn public_key(&self) -> &VerificationKey {
        &self.public_key
    }

    /// Look up every record indexed under `hash`
    ///
    /// Fails with [`Error::InvalidEnvelope`] when the response is not signed
    /// by the instance key.
    pub async fn lookup(&self, hash: &str) -> Result<LookupResponse> {
        let url = self.lookup_url(hash)?;
        tracing::debug!("Chronicle lookup: {}", url);
        let response = self
            .transport
            .get(url.as_str())
            .await?
            .error_for_status("Chronicle lookup")?;
        decode_signed_json(&response, &self.public_key)
    }

    /// `{url}/lookup/{hash}`, with `hash` encoded as a single path segment
    fn lookup_url(&self, hash: &str) -> Result<Url> {
        let mut url = Url::parse(&self.url)?;
        url.path_segments_mut()
            .map_err(|()| Error::Url(format!("{} cannot be a base", self.url)))?
            .pop_if_empty()
            .push("lookup")
            .push(hash);
        Ok(url)
    }

    /// Whether the log holds a valid record for `hash` attesting to `expect`
    ///
    /// `strictness` governs how an unsigned envelope is reported. Records are
    /// always validated strictly once the envelope has been accepted.
    pub async fn attests(
        &self,
        hash: &str,
        expect: &RecordExpectation<'_>,
        strictness: Strictness,
    ) -> Result<bool> {
        let response = match self.lookup(hash).await {
            Ok(response) => response,
            Err(Error::InvalidEnvelope) => {
                tracing::warn!("Chronicle response for {} carries no valid signature", hash);
                return strictness.reject(Error::InvalidEnvelope);
            }
            Err(e) => return Err(e),
        };
        response.any_valid(expect, strictness.escalate())
    }
}
