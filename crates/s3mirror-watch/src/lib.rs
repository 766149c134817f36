//! s3mirror Watch - Filesystem-to-object-storage synchronization engine
//!
//! Continuously mirrors configured local directory trees to remote
//! buckets: filesystem events are classified into semantic actions,
//! resolved to their owning sync mapping, and dispatched as concurrent
//! remote operations while a live, recursive watch set tracks every
//! directory under the configured roots.
//!
//! ## Architecture
//!
//! ```text
//! inotify / kqueue
//!       │
//!       ▼
//!  map_notify_event ──→ mpsc::channel ──→ event loop
//!                                           │ classify (stat)
//!                                           │ mutate WatchSet (sync)
//!                                           ▼
//!                                     TaskTracker ──→ IObjectStorage
//! ```
//!
//! ## Modules
//!
//! - [`engine`] - Event loop, dispatcher, and graceful-shutdown protocol
//! - [`classifier`] - Raw event to semantic [`classifier::Action`] mapping
//! - [`watchset`] - The live set of per-directory watch registrations
//! - [`resolver`] - Longest-prefix mapping lookup for changed paths
//! - [`walk`] - Pure directory traversal shared by watch set and classifier

pub mod classifier;
pub mod engine;
pub mod resolver;
pub mod walk;
pub mod watchset;

use thiserror::Error;

/// Errors that can occur while running the watcher engine
#[derive(Debug, Error)]
pub enum WatchError {
    /// The OS notification backend could not be initialized.
    /// Fatal: the engine does not start.
    #[error("Failed to initialize filesystem watcher: {0}")]
    Init(#[from] notify::Error),
}
