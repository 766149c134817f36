//! s3mirror Store - S3-compatible object storage adapter
//!
//! Implements the [`IObjectStorage`] port over the `object_store` crate,
//! targeting Amazon S3 and S3-compatible endpoints (MinIO, Ceph RGW).
//! Credentials come from the environment; per-profile region and
//! endpoint settings come from the configuration file.

pub mod adapter;

pub use adapter::S3ObjectStorage;
