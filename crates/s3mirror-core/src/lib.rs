//! s3mirror Core - Domain logic and port definitions
//!
//! This crate contains the shared core of s3mirror:
//! - **Domain entities** - `SyncMapping` and its validation rules
//! - **Port definitions** - Traits for adapters: `IObjectStorage`, `ISyncMappingStore`
//! - **Configuration** - The persisted YAML model mapping local roots to
//!   storage profiles and buckets
//!
//! # Architecture
//!
//! The watcher engine in `s3mirror-watch` depends only on the port traits
//! defined here. Concrete adapters (the `object_store`-backed S3 client,
//! the YAML configuration store) live in sibling crates and are injected
//! at startup by the binaries.

pub mod config;
pub mod domain;
pub mod ports;
