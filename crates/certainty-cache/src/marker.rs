//! File system backed cache marker

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Local, Utc};
use tokio::fs;

use crate::Result;

/// Name of the marker file inside the data directory
pub const MARKER_FILE: &str = "ca-certs.cache";

/// Default time-to-live of a synchronization (24 hours)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Timestamp of the last successful synchronization
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── ca-certs.json
/// ├── ca-certs.cache   <- this marker
/// └── cacert-*.pem
/// ```
#[derive(Debug, Clone)]
pub struct CacheMarker {
    path: PathBuf,
    ttl: Duration,
}

impl CacheMarker {
    /// Create a marker in `data_dir` with the default TTL
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(MARKER_FILE),
            ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Set the time-to-live
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Path of the marker file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Configured time-to-live
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Read the recorded timestamp
    ///
    /// Returns `None` when the marker is missing or cannot be parsed.
    pub async fn read(&self) -> Option<DateTime<FixedOffset>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Could not read cache marker {}: {}", self.path.display(), e);
                }
                return None;
            }
        };
        match DateTime::parse_from_rfc3339(content.trim()) {
            Ok(time) => Some(time),
            Err(e) => {
                tracing::warn!("Unparseable cache marker {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Whether the last synchronization is older than the TTL
    pub async fn is_stale(&self) -> bool {
        self.is_stale_at(Utc::now()).await
    }

    /// Whether the last synchronization is older than the TTL at `now`
    pub async fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        let Some(cached) = self.read().await else {
            return true;
        };
        let elapsed = now.signed_duration_since(cached);
        match chrono::Duration::from_std(self.ttl) {
            Ok(ttl) => elapsed >= ttl,
            Err(_) => false,
        }
    }

    /// Record a successful synchronization now
    pub async fn touch(&self) -> Result<()> {
        self.touch_at(Local::now().fixed_offset()).await
    }

    /// Record a successful synchronization at `time`
    pub async fn touch_at(&self, time: DateTime<FixedOffset>) -> Result<()> {
        fs::write(&self.path, time.to_rfc3339()).await?;
        Ok(())
    }
}
