//! HTTP client construction
//!
//! Catalog downloads must travel over TLS that is itself anchored in a
//! verified bundle. When no verified bundle is available yet, the embedded
//! webpki roots serve as the initial trust anchor set.

use std::path::Path;
use std::sync::Arc;

use certainty_chronicle::{HttpTransport, Transport};
use certainty_types::TrustChannel;

use crate::catalog::Catalog;
use crate::config::{SelectionPolicy, Timeouts};
use crate::error::{Error, Result};
use crate::fetch::Fetch;

/// Build an HTTPS-only client requiring TLS 1.2 or newer
///
/// With `ca_bundle` the client trusts exactly the certificates in that PEM
/// bundle; without it, the embedded webpki roots.
pub fn http_client(ca_bundle: Option<&[u8]>, timeouts: &Timeouts) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .min_tls_version(reqwest::tls::Version::TLS_1_2)
        .https_only(true)
        .connect_timeout(timeouts.connect);
    if let Some(timeout) = timeouts.request {
        builder = builder.timeout(timeout);
    }

    if let Some(pem) = ca_bundle {
        let certs = reqwest::Certificate::from_pem_bundle(pem)
            .map_err(|e| Error::Http(format!("invalid CA bundle: {}", e)))?;
        if certs.is_empty() {
            return Err(Error::Http("CA bundle contains no certificates".into()));
        }
        builder = builder.tls_built_in_root_certs(false);
        for cert in certs {
            builder = builder.add_root_certificate(cert);
        }
    }

    builder.build().map_err(|e| Error::Http(e.to_string()))
}

/// Newest locally cached bundle whose digest matches, without touching the network
pub async fn local_bundle(data_dir: &Path) -> Result<Vec<u8>> {
    let catalog = Catalog::open(data_dir).await?;
    if !catalog.exists().await {
        return Err(Error::Config(format!(
            "no catalog in {}",
            data_dir.display()
        )));
    }
    let bundle = Fetch::new(catalog)?
        .latest_bundle(&TrustChannel::default(), SelectionPolicy::digest_only())
        .await?;
    Ok(bundle.file_contents().await?)
}

/// Transport trusting the newest local bundle, or the embedded roots
pub async fn bootstrap_transport(data_dir: &Path, timeouts: &Timeouts) -> Result<Arc<dyn Transport>> {
    let client = match local_bundle(data_dir).await {
        Ok(pem) => match http_client(Some(&pem), timeouts) {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!("Cannot trust local CA bundle, using embedded roots: {}", e);
                http_client(None, timeouts)?
            }
        },
        Err(e) => {
            tracing::debug!("No local CA bundle, using embedded roots: {}", e);
            http_client(None, timeouts)?
        }
    };
    Ok(Arc::new(HttpTransport::new(client)))
}
