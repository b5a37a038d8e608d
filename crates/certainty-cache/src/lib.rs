//! Synchronization cache marker
//!
//! The marker is a single human-readable timestamp recording the last fully
//! successful synchronization. A missing or unreadable marker means the
//! local catalog is stale.
//!
//! # Example
//!
//! ```no_run
//! use certainty_cache::CacheMarker;
//!
//! # async fn example() -> Result<(), certainty_cache::Error> {
//! let marker = CacheMarker::new("/var/lib/certainty");
//! if marker.is_stale().await {
//!     // refresh the catalog, then:
//!     marker.touch().await?;
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod marker;

pub use error::{Error, Result};
pub use marker::{CacheMarker, DEFAULT_CACHE_TTL, MARKER_FILE};
