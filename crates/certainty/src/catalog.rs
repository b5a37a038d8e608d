//! The on-disk catalog of candidate bundles
//!
//! `ca-certs.json` is a JSON array of rows. Loading is lenient: rows that do
//! not parse, rows already quarantined, rows of other trust channels and rows
//! whose file is missing are skipped. Writes go through an exclusive lock on
//! `ca-certs.json.lock` and replace the file atomically.

use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use certainty_types::{CatalogEntry, TrustChannel};
use chrono::Local;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Catalog filename inside the data directory
pub const CATALOG_FILE: &str = "ca-certs.json";

/// Lock file guarding catalog writes
pub const LOCK_FILE: &str = "ca-certs.json.lock";

const TEMP_FILE: &str = "ca-certs.json.tmp";
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(25);
const LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// A selectable catalog row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Sort key derived from the row date, unique within one load
    pub key: u64,
    /// Position of the row in the persisted catalog
    pub index: usize,
    /// The parsed row
    pub entry: CatalogEntry,
}

/// Derive the sort key for a catalog date
///
/// Digits are kept, padded or cut to `YYYYMMDDhhmmss`, then four zeros are
/// appended to leave room for collisions.
pub fn selection_key(date: &str) -> u64 {
    let mut digits: String = date.chars().filter(char::is_ascii_digit).take(14).collect();
    while digits.len() < 14 {
        digits.push('0');
    }
    digits.push_str("0000");
    digits.parse().unwrap_or(0)
}

/// Exclusive hold on the catalog, released on drop
#[derive(Debug)]
pub struct CatalogLock {
    _file: File,
}

fn try_flock_exclusive(file: &File) -> io::Result<bool> {
    #[cfg(unix)]
    {
        use std::os::unix::io::AsRawFd;
        let fd = file.as_raw_fd();
        // SAFETY: fd is a valid descriptor owned by `file` for the duration of the call.
        let result = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };
        if result == 0 {
            return Ok(true);
        }
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::WouldBlock || err.raw_os_error() == Some(libc::EWOULDBLOCK)
        {
            return Ok(false);
        }
        Err(err)
    }
    #[cfg(not(unix))]
    {
        let _ = file;
        Ok(true)
    }
}

/// Handle on the catalog of one data directory
#[derive(Debug, Clone)]
pub struct Catalog {
    data_dir: PathBuf,
}

impl Catalog {
    /// Catalog in `data_dir`, without checking that it exists
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Catalog in `data_dir`, which must be an existing directory
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        match tokio::fs::metadata(&data_dir).await {
            Ok(meta) if meta.is_dir() => Ok(Self { data_dir }),
            _ => Err(Error::Config(format!(
                "{} is not a directory",
                data_dir.display()
            ))),
        }
    }

    /// The data directory
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of `ca-certs.json`
    pub fn path(&self) -> PathBuf {
        self.data_dir.join(CATALOG_FILE)
    }

    /// Path of the lock file
    pub fn lock_path(&self) -> PathBuf {
        self.data_dir.join(LOCK_FILE)
    }

    /// Whether `ca-certs.json` exists
    pub async fn exists(&self) -> bool {
        tokio::fs::try_exists(self.path()).await.unwrap_or(false)
    }

    /// Read every persisted row, unfiltered
    pub async fn read_rows(&self) -> Result<Vec<Value>> {
        let path = self.path();
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            Error::Config(format!("cannot read catalog {}: {}", path.display(), e))
        })?;
        match serde_json::from_slice(&bytes) {
            Ok(Value::Array(rows)) => Ok(rows),
            Ok(_) => Err(Error::Config(format!(
                "catalog {} is not a JSON array",
                path.display()
            ))),
            Err(e) => Err(Error::Config(format!(
                "cannot parse catalog {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Selectable rows of `channel`, newest first
    pub async fn load(&self, channel: &TrustChannel) -> Result<Vec<Candidate>> {
        self.load_filtered(Some(channel)).await
    }

    /// Selectable rows of every channel, newest first
    pub async fn load_all(&self) -> Result<Vec<Candidate>> {
        self.load_filtered(None).await
    }

    async fn load_filtered(&self, channel: Option<&TrustChannel>) -> Result<Vec<Candidate>> {
        let rows = self.read_rows().await?;
        let mut taken = HashSet::new();
        let mut candidates = Vec::new();

        for (index, row) in rows.iter().enumerate() {
            let Some(entry) = CatalogEntry::from_row(row) else {
                tracing::debug!("Skipping malformed catalog row {}", index);
                continue;
            };
            if entry.is_quarantined() {
                continue;
            }
            if channel.is_some_and(|c| c.as_str() != entry.trust_channel) {
                continue;
            }
            let file = self.data_dir.join(&entry.file);
            if !tokio::fs::try_exists(&file).await.unwrap_or(false) {
                tracing::debug!("Skipping catalog row {}: {} missing", index, file.display());
                continue;
            }

            let mut key = selection_key(&entry.date);
            while !taken.insert(key) {
                key += 1;
            }
            candidates.push(Candidate { key, index, entry });
        }

        candidates.sort_by(|a, b| b.key.cmp(&a.key));
        Ok(candidates)
    }

    /// Mark the persisted row at `index` as bad
    ///
    /// The whole catalog is re-read and rewritten under the catalog lock, so
    /// concurrent quarantines do not lose each other's updates.
    pub async fn quarantine(&self, index: usize, reason: &str) -> Result<()> {
        let _lock = self.lock().await?;
        let mut rows = self.read_rows().await?;
        let row = rows
            .get_mut(index)
            .and_then(Value::as_object_mut)
            .ok_or(Error::QuarantineIndex(index))?;
        row.insert(
            "bad-bundle".to_string(),
            Value::String(format!(
                "Marked bad on {} for reason: {}",
                Local::now().to_rfc3339(),
                reason
            )),
        );
        self.write_atomic(&to_pretty_json(&rows)?).await?;
        tracing::warn!("Quarantined catalog row {}: {}", index, reason);
        Ok(())
    }

    /// Install `rows` as the new catalog, pretty-printed
    ///
    /// An existing catalog is first renamed to
    /// `ca-certs-backup-YYYYMMDDHHMMSS.json`. Returns the backup path.
    pub async fn replace(&self, rows: &[Value]) -> Result<Option<PathBuf>> {
        let contents = to_pretty_json(rows)?;
        let _lock = self.lock().await?;
        let backup = if self.exists().await {
            let backup = self.backup_path().await;
            tokio::fs::rename(self.path(), &backup).await?;
            tracing::info!("Backed up catalog to {}", backup.display());
            Some(backup)
        } else {
            None
        };
        self.write_atomic(&contents).await?;
        Ok(backup)
    }

    async fn backup_path(&self) -> PathBuf {
        let stamp = Local::now().format("%Y%m%d%H%M%S");
        let mut path = self.data_dir.join(format!("ca-certs-backup-{}.json", stamp));
        let mut n = 1;
        while tokio::fs::try_exists(&path).await.unwrap_or(false) {
            path = self
                .data_dir
                .join(format!("ca-certs-backup-{}-{}.json", stamp, n));
            n += 1;
        }
        path
    }

    async fn write_atomic(&self, contents: &[u8]) -> Result<()> {
        let temp = self.data_dir.join(TEMP_FILE);
        tokio::fs::write(&temp, contents).await?;
        tokio::fs::rename(&temp, self.path()).await?;
        Ok(())
    }

    /// Take the exclusive catalog lock, waiting for other holders
    pub async fn lock(&self) -> Result<CatalogLock> {
        let path = self.lock_path();
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .await
            .map_err(|e| Error::Lock(format!("opening {}: {}", path.display(), e)))?
            .into_std()
            .await;

        let start = Instant::now();
        loop {
            match try_flock_exclusive(&file) {
                Ok(true) => return Ok(CatalogLock { _file: file }),
                Ok(false) if start.elapsed() < LOCK_TIMEOUT => {
                    tokio::time::sleep(LOCK_POLL_INTERVAL).await;
                }
                Ok(false) => {
                    return Err(Error::Lock(format!(
                        "timed out waiting for {}",
                        path.display()
                    )))
                }
                Err(e) => return Err(Error::Lock(format!("locking {}: {}", path.display(), e))),
            }
        }
    }
}

fn to_pretty_json(rows: &[Value]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    rows.serialize(&mut serializer)?;
    Ok(out)
}
