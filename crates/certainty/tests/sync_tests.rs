//! Catalog synchronization tests
//!
//! A [`RemoteFetch`] is pointed at an in-memory mirror; the tests observe
//! what lands on disk and which requests were made.

mod common;

use certainty::{Error, SelectionPolicy, TrustChannel, CATALOG_FILE};
use chrono::Local;
use common::{quarantine_reason, Harness, REMOTE_URL};
use rstest::rstest;
use serde_json::json;

const OLD: &[u8] = b"-----BEGIN CERTIFICATE-----\nold\n-----END CERTIFICATE-----\n";
const NEW: &[u8] = b"-----BEGIN CERTIFICATE-----\nnew\n-----END CERTIFICATE-----\n";

/// Serve two bundles plus rows the synchronization must not download
async fn serve_two(h: &Harness) -> Vec<serde_json::Value> {
    let rows = vec![
        h.row("2018-01-17", "cacert-2018-01-17.pem", OLD, &h.primary),
        h.row("2018-06-20", "cacert.pem", NEW, &h.primary),
        h.row("2018-07-01", "../escape.pem", b"x", &h.primary),
        json!({"date": "2018-08-01", "note": "no file"}),
    ];
    h.serve_remote(
        &rows,
        &[
            ("cacert-2018-01-17.pem", OLD),
            ("cacert.pem", NEW),
            ("../escape.pem", b"x"),
        ],
    )
    .await;
    rows
}

// ==== Refresh ====

#[tokio::test]
async fn test_refresh_installs_catalog_and_bundles() {
    let h = Harness::new();
    serve_two(&h).await;
    let remote = h.remote();
    assert!(remote.is_stale().await);

    let report = remote.refresh().await.unwrap();
    assert_eq!(report.backup, None);
    assert_eq!(
        report.downloaded,
        vec![h.path("cacert-2018-01-17.pem"), h.path("cacert.pem")]
    );
    assert_eq!(tokio::fs::read(h.path("cacert.pem")).await.unwrap(), NEW);
    assert!(!h.data_dir().join("../escape.pem").exists());
    assert_eq!(
        h.downloads().await,
        vec![
            format!("{}cacert-2018-01-17.pem", REMOTE_URL),
            format!("{}cacert.pem", REMOTE_URL),
        ]
    );

    assert_eq!(h.read_rows().await.len(), 4);
    let installed = tokio::fs::read_to_string(h.path(CATALOG_FILE)).await.unwrap();
    assert!(installed.starts_with("[\n    {\n        \""), "{}", installed);
    assert!(!remote.is_stale().await);
    assert!(remote.fetch().is_unverified(&h.path("cacert.pem")).await);
}

#[tokio::test]
async fn test_second_refresh_downloads_nothing() {
    let h = Harness::new();
    serve_two(&h).await;
    let remote = h.remote();
    remote.refresh().await.unwrap();

    let stale = Local::now().fixed_offset() - chrono::Duration::days(2);
    remote.marker().touch_at(stale).await.unwrap();
    assert!(remote.is_stale().await);
    h.transport.clear_requests().await;

    let report = remote.refresh().await.unwrap();
    assert!(report.downloaded.is_empty());
    assert!(h.downloads().await.is_empty());
    assert!(!remote.is_stale().await);

    let backup = report.backup.unwrap();
    let name = backup.file_name().unwrap().to_str().unwrap().to_string();
    assert!(name.starts_with("ca-certs-backup-"), "{}", name);
    assert_eq!(
        tokio::fs::read(&backup).await.unwrap(),
        tokio::fs::read(h.path(CATALOG_FILE)).await.unwrap()
    );
}

#[tokio::test]
async fn test_existing_bundle_not_downloaded() {
    let h = Harness::new();
    serve_two(&h).await;
    h.write_bundle("cacert-2018-01-17.pem", OLD).await;

    let report = h.remote().refresh().await.unwrap();
    assert_eq!(report.downloaded, vec![h.path("cacert.pem")]);
}

#[tokio::test]
async fn test_failed_download_aborts_without_marker() {
    let h = Harness::new();
    serve_two(&h).await;
    h.transport
        .remove(&format!("{}cacert.pem", REMOTE_URL))
        .await;
    let remote = h.remote();

    assert!(matches!(remote.refresh().await, Err(Error::Sync(_))));
    assert!(remote.is_stale().await);
    assert!(!h.path("cacert.pem").exists());

    // The next attempt retries the whole cycle
    h.transport
        .insert(
            format!("{}cacert.pem", REMOTE_URL),
            certainty::chronicle::HttpResponse::ok(NEW),
        )
        .await;
    let report = remote.refresh().await.unwrap();
    assert_eq!(report.downloaded, vec![h.path("cacert.pem")]);
    assert!(!remote.is_stale().await);
}

#[tokio::test]
async fn test_malformed_remote_catalog_keeps_local() {
    let h = Harness::new();
    let local = vec![h.row("2018-01-17", "cacert-2018-01-17.pem", OLD, &h.primary)];
    h.write_catalog(&local).await;
    h.transport
        .insert(
            format!("{}{}", REMOTE_URL, CATALOG_FILE),
            certainty::chronicle::HttpResponse::ok("<html>maintenance</html>"),
        )
        .await;
    let remote = h.remote();

    assert!(matches!(remote.refresh().await, Err(Error::Sync(_))));
    assert_eq!(h.read_rows().await, local);
    assert!(remote.is_stale().await);

    let mut entries = tokio::fs::read_dir(h.data_dir()).await.unwrap();
    while let Some(entry) = entries.next_entry().await.unwrap() {
        let name = entry.file_name();
        assert!(!name.to_string_lossy().starts_with("ca-certs-backup-"));
    }
}

#[rstest]
#[case(86_399, false)]
#[case(86_401, true)]
#[tokio::test]
async fn test_staleness_boundary(#[case] elapsed: i64, #[case] stale: bool) {
    let h = Harness::new();
    let remote = h.remote();
    let synced = Local::now().fixed_offset() - chrono::Duration::seconds(elapsed);
    remote.marker().touch_at(synced).await.unwrap();
    assert_eq!(remote.is_stale().await, stale);
}

// ==== Selection over a synchronized catalog ====

#[tokio::test]
async fn test_latest_bundle_refreshes_and_checks_new_downloads() {
    let h = Harness::new();
    let rows = serve_two(&h).await;
    h.publish(&rows[1]).await;
    let remote = h.remote();

    let bundle = remote
        .latest_bundle(&TrustChannel::default(), SelectionPolicy::default())
        .await
        .unwrap();
    assert_eq!(bundle.file_path(), h.path("cacert.pem"));
    assert_eq!(h.lookups().await, 1);
    assert!(!remote.fetch().is_unverified(&h.path("cacert.pem")).await);

    // Fresh cache and an already attested bundle: no network at all
    h.transport.clear_requests().await;
    let again = remote
        .latest_bundle(&TrustChannel::default(), SelectionPolicy::default())
        .await
        .unwrap();
    assert_eq!(again, bundle);
    assert!(h.transport.requests().await.is_empty());
}

#[tokio::test]
async fn test_unattested_download_quarantined() {
    let h = Harness::new();
    let rows = serve_two(&h).await;
    h.publish_records(rows[1]["chronicle"].as_str().unwrap(), vec![])
        .await;
    h.publish(&rows[0]).await;
    let remote = h.remote();

    let bundle = remote
        .latest_bundle(&TrustChannel::default(), SelectionPolicy::default())
        .await
        .unwrap();
    assert_eq!(bundle.file_path(), h.path("cacert-2018-01-17.pem"));
    assert!(quarantine_reason(&h.read_rows().await[1])
        .unwrap()
        .ends_with("for reason: Chronicle"));
}

#[tokio::test]
async fn test_remote_enforces_signatures_by_default() {
    let h = Harness::new();
    let stranger = certainty::crypto::KeyPair::generate_ed25519().unwrap();
    let rows = vec![
        h.row("2018-01-17", "cacert-2018-01-17.pem", OLD, &h.primary),
        h.row("2018-06-20", "cacert.pem", NEW, &stranger),
    ];
    h.serve_remote(&rows, &[("cacert-2018-01-17.pem", OLD), ("cacert.pem", NEW)])
        .await;
    h.publish(&rows[0]).await;
    h.publish(&rows[1]).await;

    let bundle = h
        .remote()
        .latest_bundle(&TrustChannel::default(), SelectionPolicy::default())
        .await
        .unwrap();
    assert_eq!(bundle.file_path(), h.path("cacert-2018-01-17.pem"));
    assert!(quarantine_reason(&h.read_rows().await[1])
        .unwrap()
        .ends_with("Ed25519 signature mismatch"));
}

#[tokio::test]
async fn test_list_bundles_refreshes_when_stale() {
    let h = Harness::new();
    serve_two(&h).await;
    let remote = h.remote();

    let listed = remote
        .list_bundles(None, &TrustChannel::default())
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(remote.all_bundles(None).await.unwrap().len(), 2);
    assert_eq!(
        h.transport
            .requests()
            .await
            .iter()
            .filter(|url| url.ends_with(CATALOG_FILE))
            .count(),
        1
    );
}
