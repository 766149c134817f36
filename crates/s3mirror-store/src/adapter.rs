//! `object_store`-backed implementation of the storage port
//!
//! One `object_store` client is bound to a single bucket, so clients are
//! cached per `(profile, bucket)` pair and built lazily on first use.
//! The cache lock is held only for the map lookup/insert, never across
//! a remote call.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use bytes::Bytes;
use futures::StreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use tokio::sync::RwLock;
use tracing::debug;

use s3mirror_core::config::ProfileConfig;
use s3mirror_core::ports::IObjectStorage;

/// Storage adapter over S3-compatible object stores
pub struct S3ObjectStorage {
    /// Per-profile connection settings from the configuration file
    profiles: BTreeMap<String, ProfileConfig>,
    /// Lazily built clients keyed by (profile, bucket)
    clients: RwLock<HashMap<(String, String), Arc<dyn ObjectStore>>>,
}

impl S3ObjectStorage {
    /// Creates the adapter from the configured profiles
    ///
    /// No network access happens here; clients are built on first use
    /// so a misconfigured profile only fails the operations that touch
    /// it.
    pub fn new(profiles: BTreeMap<String, ProfileConfig>) -> Self {
        Self {
            profiles,
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached client for `(profile, bucket)`, building it
    /// on first use.
    async fn client(&self, profile: &str, bucket: &str) -> Result<Arc<dyn ObjectStore>> {
        let cache_key = (profile.to_string(), bucket.to_string());

        if let Some(client) = self.clients.read().await.get(&cache_key) {
            return Ok(Arc::clone(client));
        }

        let settings = self
            .profiles
            .get(profile)
            .with_context(|| format!("Unknown storage profile: {}", profile))?;

        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .with_region(&settings.region);
        if let Some(endpoint) = &settings.endpoint {
            builder = builder.with_endpoint(endpoint);
        }
        if settings.allow_http {
            builder = builder.with_allow_http(true);
        }

        let client: Arc<dyn ObjectStore> = Arc::new(
            builder
                .build()
                .with_context(|| format!("Failed to build S3 client for profile {}", profile))?,
        );

        debug!(profile, bucket, "Built object storage client");
        self.clients
            .write()
            .await
            .insert(cache_key, Arc::clone(&client));
        Ok(client)
    }
}

#[async_trait::async_trait]
impl IObjectStorage for S3ObjectStorage {
    async fn put_object(
        &self,
        profile: &str,
        bucket: &str,
        key: &str,
        local_path: &Path,
    ) -> Result<()> {
        let client = self.client(profile, bucket).await?;
        let location = parse_key(key)?;

        let data = tokio::fs::read(local_path)
            .await
            .with_context(|| format!("Failed to read {} for upload", local_path.display()))?;

        client
            .put(&location, PutPayload::from(Bytes::from(data)))
            .await
            .with_context(|| format!("Failed to put object {}:{}", bucket, key))?;
        Ok(())
    }

    async fn delete_prefix(&self, profile: &str, bucket: &str, key_prefix: &str) -> Result<()> {
        let client = self.client(profile, bucket).await?;
        let prefix = parse_key(key_prefix)?;

        // Former directory: every object below the prefix.
        let mut listing = client.list(Some(&prefix));
        while let Some(meta) = listing.next().await {
            let meta = meta
                .with_context(|| format!("Failed to list objects under {}:{}", bucket, key_prefix))?;
            client
                .delete(&meta.location)
                .await
                .with_context(|| format!("Failed to delete object {}:{}", bucket, meta.location))?;
        }

        // Former file: the exact-match object. Absent is fine; the key
        // may only ever have named a directory.
        match client.delete(&prefix).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(err) => {
                Err(err).with_context(|| format!("Failed to delete object {}:{}", bucket, key_prefix))
            }
        }
    }
}

/// Parses an object key into an `object_store` path
fn parse_key(key: &str) -> Result<ObjectPath> {
    ObjectPath::parse(key).with_context(|| format!("Invalid object key: {}", key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> S3ObjectStorage {
        let mut profiles = BTreeMap::new();
        profiles.insert(
            "p1".to_string(),
            ProfileConfig {
                region: "eu-west-1".to_string(),
                endpoint: None,
                allow_http: false,
                syncs: BTreeMap::new(),
            },
        );
        S3ObjectStorage::new(profiles)
    }

    #[test]
    fn test_parse_key() {
        assert_eq!(parse_key("x.txt").unwrap(), ObjectPath::from("x.txt"));
        assert_eq!(
            parse_key("backup/sub/x.txt").unwrap(),
            ObjectPath::from("backup/sub/x.txt")
        );
    }

    #[tokio::test]
    async fn test_unknown_profile_is_rejected() {
        let storage = adapter();
        let err = storage
            .put_object("ghost", "b1", "x.txt", Path::new("/tmp/x.txt"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Unknown storage profile"));
    }
}
