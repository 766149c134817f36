//! Configuration module for s3mirror.
//!
//! Provides typed configuration structs that map to the YAML
//! configuration file, with loading, saving, validation, and defaults.
//!
//! The file is organized by credential profile, each carrying its own
//! set of sync entries:
//!
//! ```yaml
//! profiles:
//!   p1:
//!     region: eu-west-1
//!     endpoint: null
//!     syncs:
//!       docs:
//!         local: /home/user/docs
//!         bucket: b1
//!         key_prefix: ""
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::SyncMapping;
use crate::ports::ISyncMappingStore;

/// Environment variable overriding the configuration directory.
const CONFIG_DIR_ENV: &str = "S3MIRROR_CONFIG_DIR";

/// Top-level configuration for s3mirror.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Credential profiles keyed by name.
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileConfig>,
}

/// Settings for one credential profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Region of the target store, e.g. `eu-west-1`.
    pub region: String,
    /// Optional endpoint URL for S3-compatible stores (MinIO, Ceph).
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Allow plain-HTTP endpoints. Only sensible for local test stores.
    #[serde(default)]
    pub allow_http: bool,
    /// Sync entries keyed by a user-chosen name.
    #[serde(default)]
    pub syncs: BTreeMap<String, SyncEntry>,
}

/// One configured local-root-to-bucket entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncEntry {
    /// Absolute path of the mirrored local directory.
    pub local: PathBuf,
    /// Target bucket name.
    pub bucket: String,
    /// Object-key namespace; empty means the bucket root.
    #[serde(default)]
    pub key_prefix: String,
}

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Write the configuration as YAML to `path`, creating parent
    /// directories as needed.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Precedence: `$S3MIRROR_CONFIG_DIR/config.yaml`, then
    /// `$XDG_CONFIG_HOME/s3mirror/config.yaml`.
    pub fn default_path() -> PathBuf {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            if !dir.is_empty() {
                return PathBuf::from(dir).join("config.yaml");
            }
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("s3mirror")
            .join("config.yaml")
    }

    /// Registers a profile. Returns `false` if the name is already taken.
    pub fn add_profile(&mut self, name: &str, region: &str, endpoint: Option<String>) -> bool {
        if self.profiles.contains_key(name) {
            return false;
        }
        self.profiles.insert(
            name.to_string(),
            ProfileConfig {
                region: region.to_string(),
                endpoint,
                allow_http: false,
                syncs: BTreeMap::new(),
            },
        );
        true
    }

    /// Adds a sync entry under `profile`.
    ///
    /// The entry passes through [`SyncMapping::new`], so the domain
    /// rules (absolute root, non-empty names) apply at the point of
    /// entry rather than only at validation time.
    ///
    /// # Errors
    /// Fails if the mapping is invalid, the profile does not exist, or
    /// another entry already claims the same local root.
    pub fn add_sync(
        &mut self,
        profile: &str,
        name: &str,
        local: &Path,
        bucket: &str,
        key_prefix: &str,
    ) -> anyhow::Result<()> {
        let mapping = SyncMapping::new(local, profile, bucket, key_prefix)?;

        let exists = self
            .profiles
            .values()
            .flat_map(|p| p.syncs.values())
            .any(|s| s.local == mapping.local_root);
        if exists {
            anyhow::bail!("A sync for {} is already configured", local.display());
        }

        let profile_cfg = self
            .profiles
            .get_mut(profile)
            .ok_or_else(|| anyhow::anyhow!("Unknown profile: {}", profile))?;

        profile_cfg.syncs.insert(
            name.to_string(),
            SyncEntry {
                local: mapping.local_root,
                bucket: mapping.bucket,
                key_prefix: mapping.key_prefix,
            },
        );
        Ok(())
    }

    /// Removes the sync entry for `local`, if any. Returns whether an
    /// entry was removed.
    pub fn remove_sync(&mut self, local: &Path) -> bool {
        for profile in self.profiles.values_mut() {
            let before = profile.syncs.len();
            profile.syncs.retain(|_, s| s.local != local);
            if profile.syncs.len() != before {
                return true;
            }
        }
        false
    }

    /// Looks up the settings for a profile by name.
    pub fn profile(&self, name: &str) -> Option<&ProfileConfig> {
        self.profiles.get(name)
    }

    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let mut seen_roots: Vec<&Path> = Vec::new();

        for (profile_name, profile) in &self.profiles {
            if profile.region.is_empty() && profile.endpoint.is_none() {
                errors.push(ValidationError {
                    field: format!("profiles.{}.region", profile_name),
                    message: "must be set when no endpoint is configured".into(),
                });
            }

            for (sync_name, sync) in &profile.syncs {
                let field = |leaf: &str| {
                    format!("profiles.{}.syncs.{}.{}", profile_name, sync_name, leaf)
                };

                if !sync.local.is_absolute() {
                    errors.push(ValidationError {
                        field: field("local"),
                        message: "must be an absolute path".into(),
                    });
                }
                if sync.bucket.is_empty() {
                    errors.push(ValidationError {
                        field: field("bucket"),
                        message: "must not be empty".into(),
                    });
                }
                if seen_roots.contains(&sync.local.as_path()) {
                    errors.push(ValidationError {
                        field: field("local"),
                        message: "duplicate local root".into(),
                    });
                }
                seen_roots.push(&sync.local);
            }
        }

        errors
    }
}

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"profiles.p1.region"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl ISyncMappingStore for Config {
    /// Flattens the per-profile sync entries into the mapping list the
    /// engine consumes. Iteration order is deterministic (sorted by
    /// profile name, then sync name), which fixes which entry counts as
    /// "first registered" for duplicate roots.
    fn snapshot(&self) -> Vec<SyncMapping> {
        let mut mappings = Vec::new();
        for (profile_name, profile) in &self.profiles {
            for sync in profile.syncs.values() {
                mappings.push(SyncMapping {
                    local_root: sync.local.clone(),
                    profile: profile_name.clone(),
                    bucket: sync.bucket.clone(),
                    key_prefix: sync.key_prefix.clone(),
                });
            }
        }
        mappings
    }
}
