//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are the interfaces the watcher engine depends on; their
//! implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IObjectStorage`] - Remote object operations (put, delete-prefix)
//! - [`ISyncMappingStore`] - Startup snapshot of configured sync mappings

pub mod mapping_store;
pub mod object_storage;

pub use mapping_store::ISyncMappingStore;
pub use object_storage::IObjectStorage;
