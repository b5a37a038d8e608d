//! Chronicle lookup response types and record validation

use certainty_crypto::{base64url_decode, TrustAnchors, VerificationKey};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How validation reports malformed or contradictory data
///
/// Lenient validation answers `false`; strict validation raises an error so
/// callers can tell "could not be evaluated" apart from "proven wrong".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Report problems as a failed check
    #[default]
    Lenient,
    /// Report problems as errors
    Strict,
}

impl Strictness {
    /// The mode used once record contents are being inspected
    pub fn escalate(self) -> Self {
        Strictness::Strict
    }

    /// Turn a problem into the outcome this mode calls for
    pub fn reject(self, err: Error) -> Result<bool> {
        match self {
            Strictness::Lenient => Ok(false),
            Strictness::Strict => Err(err),
        }
    }
}

/// Response body of `GET /lookup/{hash}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LookupResponse {
    /// Response version
    #[serde(default)]
    pub version: Option<String>,
    /// Server time
    #[serde(default)]
    pub datetime: Option<String>,
    /// Status string
    #[serde(default)]
    pub status: Option<String>,
    /// Matching records
    #[serde(default)]
    pub results: Vec<LogRecord>,
}

/// One record published to the log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Record contents (free text, usually JSON)
    #[serde(default)]
    pub contents: Option<String>,
    /// base64url Ed25519 signature over `contents`
    #[serde(default)]
    pub signature: Option<String>,
    /// base64url Ed25519 key that produced `signature`
    #[serde(default)]
    pub publickey: Option<String>,
    /// Chain hash
    #[serde(default)]
    pub hash: Option<String>,
    /// Previous chain hash
    #[serde(default)]
    pub prev: Option<String>,
    /// Summary hash
    #[serde(default)]
    pub summary: Option<String>,
    /// Creation time
    #[serde(default)]
    pub created: Option<String>,
}

/// What a record must attest to
#[derive(Debug, Clone, Copy)]
pub struct RecordExpectation<'a> {
    /// Hex digest of the bundle
    pub digest: &'a str,
    /// Repository identifier, e.g. `paragonie/certainty`
    pub repository: &'a str,
    /// Keys allowed to publish records
    pub anchors: &'a TrustAnchors,
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

impl LogRecord {
    /// Check that this record was published by a trust anchor and attests
    /// to the expected digest and repository
    ///
    /// A record signed by some other key is never an error: the log is
    /// public and anyone may publish to it.
    pub fn validate(&self, expect: &RecordExpectation<'_>, strictness: Strictness) -> Result<bool> {
        let (Some(signature), Some(contents), Some(publickey)) = (
            non_empty(&self.signature),
            non_empty(&self.contents),
            non_empty(&self.publickey),
        ) else {
            return strictness.reject(Error::IncompleteRecord);
        };

        let public_key = match base64url_decode(publickey) {
            Ok(key) => key,
            Err(e) => return strictness.reject(e.into()),
        };
        if !expect.anchors.contains(&public_key) {
            return Ok(false);
        }

        let signature = match base64url_decode(signature) {
            Ok(sig) => sig,
            Err(e) => return strictness.reject(e.into()),
        };
        let key = VerificationKey::from_bytes(&public_key)?;
        if !key.is_valid(contents.as_bytes(), &signature) {
            return strictness.reject(Error::InvalidRecordSignature);
        }

        if !contents.contains(expect.digest) {
            return strictness.reject(Error::DigestNotPresent);
        }

        let escaped = expect.repository.replace('/', "\\/");
        if !contents.contains(expect.repository) && !contents.contains(&escaped) {
            return strictness.reject(Error::RepositoryNotPresent);
        }
        Ok(true)
    }
}

impl LookupResponse {
    /// Whether any record passes [`LogRecord::validate`]
    ///
    /// Every record is examined. One passing record is enough; failing that,
    /// the first error raised by any record is returned.
    pub fn any_valid(&self, expect: &RecordExpectation<'_>, strictness: Strictness) -> Result<bool> {
        let mut first_error = None;
        for (i, record) in self.results.iter().enumerate() {
            match record.validate(expect, strictness) {
                Ok(true) => return Ok(true),
                Ok(false) => tracing::debug!("Chronicle record {} does not attest", i),
                Err(e) => {
                    tracing::debug!("Chronicle record {} rejected: {}", i, e);
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certainty_crypto::KeyPair;
    use rstest::rstest;

    const DIGEST: &str = "5cd3e1c1c4a3b8ddbe0e5e2b39b0f0ad7b1d93e1e3a8ec0be1d3bbcd52e10a6f";
    const REPO: &str = "paragonie/certainty";

    struct Fixture {
        signer: KeyPair,
        anchors: TrustAnchors,
    }

    impl Fixture {
        fn new() -> Self {
            let signer = KeyPair::generate_ed25519().unwrap();
            let backup = KeyPair::generate_ed25519().unwrap();
            let anchors = TrustAnchors::new(signer.verification_key(), backup.verification_key());
            Self { signer, anchors }
        }

        fn expect(&self) -> RecordExpectation<'_> {
            RecordExpectation {
                digest: DIGEST,
                repository: REPO,
                anchors: &self.anchors,
            }
        }

        fn record(&self, contents: &str) -> LogRecord {
            record_signed_by(&self.signer, contents)
        }
    }

    fn record_signed_by(kp: &KeyPair, contents: &str) -> LogRecord {
        LogRecord {
            contents: Some(contents.to_string()),
            signature: Some(kp.sign(contents.as_bytes()).to_base64url()),
            publickey: Some(certainty_crypto::base64url_encode(kp.public_key_bytes())),
            ..Default::default()
        }
    }

    fn attestation() -> String {
        format!(
            r#"{{"repository":"paragonie\/certainty","sha256":"{}"}}"#,
            DIGEST
        )
    }

    #[test]
    fn test_valid_record() {
        let fx = Fixture::new();
        let record = fx.record(&attestation());
        assert!(record.validate(&fx.expect(), Strictness::Strict).unwrap());
    }

    #[test]
    fn test_unescaped_repository_accepted() {
        let fx = Fixture::new();
        let record = fx.record(&format!("{} {}", REPO, DIGEST));
        assert!(record.validate(&fx.expect(), Strictness::Strict).unwrap());
    }

    #[test]
    fn test_foreign_key_is_silently_false() {
        let fx = Fixture::new();
        let stranger = KeyPair::generate_ed25519().unwrap();
        let record = record_signed_by(&stranger, &attestation());
        assert!(!record.validate(&fx.expect(), Strictness::Strict).unwrap());
    }

    #[rstest]
    #[case::signature(|r: &mut LogRecord| r.signature = None)]
    #[case::contents(|r: &mut LogRecord| r.contents = Some(String::new()))]
    #[case::publickey(|r: &mut LogRecord| r.publickey = None)]
    fn test_incomplete_record(#[case] strip: fn(&mut LogRecord)) {
        let fx = Fixture::new();
        let mut record = fx.record(&attestation());
        strip(&mut record);
        assert!(matches!(
            record.validate(&fx.expect(), Strictness::Strict),
            Err(Error::IncompleteRecord)
        ));
        assert!(!record.validate(&fx.expect(), Strictness::Lenient).unwrap());
    }

    #[test]
    fn test_tampered_contents() {
        let fx = Fixture::new();
        let mut record = fx.record(&attestation());
        record.contents = Some(attestation().replace("repository", "repositorx"));
        assert!(matches!(
            record.validate(&fx.expect(), Strictness::Strict),
            Err(Error::InvalidRecordSignature)
        ));
    }

    #[test]
    fn test_missing_digest_and_repository() {
        let fx = Fixture::new();
        let record = fx.record(r#"{"repository":"paragonie/certainty"}"#);
        assert!(matches!(
            record.validate(&fx.expect(), Strictness::Strict),
            Err(Error::DigestNotPresent)
        ));

        let record = fx.record(&format!(r#"{{"repository":"other/repo","sha256":"{}"}}"#, DIGEST));
        assert!(matches!(
            record.validate(&fx.expect(), Strictness::Strict),
            Err(Error::RepositoryNotPresent)
        ));
        assert!(!record.validate(&fx.expect(), Strictness::Lenient).unwrap());
    }

    #[test]
    fn test_any_valid_ignores_other_records() {
        let fx = Fixture::new();
        let stranger = KeyPair::generate_ed25519().unwrap();
        let response = LookupResponse {
            results: vec![
                LogRecord::default(),
                record_signed_by(&stranger, &attestation()),
                fx.record("unrelated"),
                fx.record(&attestation()),
            ],
            ..Default::default()
        };
        assert!(response.any_valid(&fx.expect(), Strictness::Strict).unwrap());
    }

    #[test]
    fn test_any_valid_reports_first_error() {
        let fx = Fixture::new();
        let stranger = KeyPair::generate_ed25519().unwrap();
        let response = LookupResponse {
            results: vec![
                record_signed_by(&stranger, &attestation()),
                fx.record("unrelated"),
                LogRecord::default(),
            ],
            ..Default::default()
        };
        assert!(matches!(
            response.any_valid(&fx.expect(), Strictness::Strict),
            Err(Error::DigestNotPresent)
        ));
    }

    #[test]
    fn test_any_valid_empty() {
        let fx = Fixture::new();
        let response = LookupResponse::default();
        assert!(!response.any_valid(&fx.expect(), Strictness::Strict).unwrap());
    }

    #[test]
    fn test_escalate() {
        assert_eq!(Strictness::Lenient.escalate(), Strictness::Strict);
        assert_eq!(Strictness::default(), Strictness::Lenient);
    }
}
