//! Object storage port (driven/secondary port)
//!
//! The watcher engine needs exactly two remote operations: put a local
//! file as an object, and delete every object under a key prefix. How a
//! provider authenticates, pages listings, or batches deletes is an
//! adapter concern.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are
//!   adapter-specific and don't need domain-level classification.
//! - Delivery is best-effort and at-least-once: callers log failures
//!   with full context and carry on; there is no built-in retry.

use std::path::Path;

/// Port trait for remote object-storage operations
///
/// Implementations must be cheap to share (`Arc`) and safe to call
/// concurrently; the dispatcher fires these from independent tasks.
#[async_trait::async_trait]
pub trait IObjectStorage: Send + Sync {
    /// Uploads the file at `local_path` as `key` in `bucket`
    ///
    /// Overwrites any existing object under the same key; object stores
    /// have no in-place modification, so modify events reuse this
    /// operation.
    ///
    /// # Arguments
    /// * `profile` - Credential profile to authenticate with
    /// * `bucket` - Target bucket name
    /// * `key` - Full object key
    /// * `local_path` - File whose content becomes the object body
    async fn put_object(
        &self,
        profile: &str,
        bucket: &str,
        key: &str,
        local_path: &Path,
    ) -> anyhow::Result<()>;

    /// Deletes every object whose key starts with `key_prefix`, plus the
    /// exact-match object if `key_prefix` itself names one
    ///
    /// This single operation covers both file deletes (exact match) and
    /// directory deletes (prefix match) in a flat key namespace.
    async fn delete_prefix(
        &self,
        profile: &str,
        bucket: &str,
        key_prefix: &str,
    ) -> anyhow::Result<()>;
}
