//! Sync mapping store port
//!
//! The engine loads the set of configured mappings exactly once at
//! startup and treats it as read-only for the lifetime of the run.
//! Mapping changes made while the watcher is running take effect only
//! after a restart.

use crate::domain::SyncMapping;

/// Port trait for reading the configured sync mappings
pub trait ISyncMappingStore: Send + Sync {
    /// Returns a snapshot of all configured mappings
    ///
    /// Ordering is significant: when two mappings register the same
    /// local root (a configuration error), the resolver keeps the
    /// first entry of the snapshot.
    fn snapshot(&self) -> Vec<SyncMapping>;
}
