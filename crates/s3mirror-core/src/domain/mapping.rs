//! Sync mapping entity
//!
//! A [`SyncMapping`] ties one local directory tree to a remote bucket:
//! everything under `local_root` is mirrored to `bucket` (reachable via
//! the credential profile `profile`) below the object-key namespace
//! `key_prefix`.
//!
//! Mappings are created by the CLI, persisted in the configuration file,
//! and read once at watcher startup. The watcher never mutates them
//! during its run; mapping changes require a restart.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// One local-root-to-bucket synchronization entry
///
/// Unique by `local_root` within a profile. Duplicate roots across
/// profiles are a configuration error; the resolver keeps the
/// first-registered entry and logs a warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMapping {
    /// Absolute path of the mirrored local directory tree
    pub local_root: PathBuf,
    /// Credential profile used to reach the bucket
    pub profile: String,
    /// Target bucket name
    pub bucket: String,
    /// Object-key namespace under which the tree is stored remotely.
    /// Empty means the bucket root.
    pub key_prefix: String,
}

impl SyncMapping {
    /// Creates a validated mapping
    ///
    /// # Errors
    /// Returns a [`DomainError`] if the root is relative or the profile
    /// or bucket name is empty.
    pub fn new(
        local_root: impl Into<PathBuf>,
        profile: impl Into<String>,
        bucket: impl Into<String>,
        key_prefix: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let local_root = local_root.into();
        let profile = profile.into();
        let bucket = bucket.into();

        if !local_root.is_absolute() {
            return Err(DomainError::RelativeRoot(
                local_root.display().to_string(),
            ));
        }
        if profile.is_empty() {
            return Err(DomainError::EmptyProfile);
        }
        if bucket.is_empty() {
            return Err(DomainError::EmptyBucket);
        }

        Ok(Self {
            local_root,
            profile,
            bucket,
            key_prefix: key_prefix.into(),
        })
    }

    /// Joins `key_prefix` with a relative key
    ///
    /// The relative key is expected to use forward slashes already
    /// (object stores have no other separator). An empty relative key
    /// yields the prefix itself.
    pub fn object_key(&self, relative: &str) -> String {
        if self.key_prefix.is_empty() {
            relative.to_string()
        } else if relative.is_empty() {
            self.key_prefix.clone()
        } else if self.key_prefix.ends_with('/') {
            format!("{}{}", self.key_prefix, relative)
        } else {
            format!("{}/{}", self.key_prefix, relative)
        }
    }

    /// Returns the relative forward-slash key for a path under this
    /// mapping's root, or `None` if the path is not under the root.
    ///
    /// The match is path-separator aware: `/data/ab` is not under the
    /// root `/data/a`.
    pub fn relative_key(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.local_root).ok()?;
        let mut key = String::new();
        for component in relative.components() {
            if !key.is_empty() {
                key.push('/');
            }
            key.push_str(&component.as_os_str().to_string_lossy());
        }
        Some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(root: &str, prefix: &str) -> SyncMapping {
        SyncMapping::new(root, "p1", "b1", prefix).unwrap()
    }

    #[test]
    fn test_new_rejects_relative_root() {
        let err = SyncMapping::new("data/docs", "p1", "b1", "").unwrap_err();
        assert!(matches!(err, DomainError::RelativeRoot(_)));
    }

    #[test]
    fn test_new_rejects_empty_profile_and_bucket() {
        assert_eq!(
            SyncMapping::new("/data", "", "b1", "").unwrap_err(),
            DomainError::EmptyProfile
        );
        assert_eq!(
            SyncMapping::new("/data", "p1", "", "").unwrap_err(),
            DomainError::EmptyBucket
        );
    }

    #[test]
    fn test_relative_key_basic() {
        let m = mapping("/data", "");
        assert_eq!(
            m.relative_key(Path::new("/data/sub/x.txt")),
            Some("sub/x.txt".to_string())
        );
        assert_eq!(m.relative_key(Path::new("/data")), Some(String::new()));
    }

    #[test]
    fn test_relative_key_is_separator_aware() {
        let m = mapping("/data/a", "");
        assert_eq!(m.relative_key(Path::new("/data/ab")), None);
    }

    #[test]
    fn test_object_key_prefix_join() {
        assert_eq!(mapping("/d", "").object_key("x.txt"), "x.txt");
        assert_eq!(mapping("/d", "backup").object_key("x.txt"), "backup/x.txt");
        assert_eq!(mapping("/d", "backup/").object_key("x.txt"), "backup/x.txt");
        assert_eq!(mapping("/d", "backup").object_key(""), "backup");
    }
}
