//! Path resolver
//!
//! Given a changed filesystem path, finds the sync mapping that owns it
//! and derives the remote destination (profile, bucket, object key).
//!
//! A root matches only on whole path components: `/data/ab` is not under
//! the root `/data/a`. When several roots match, the most specific
//! (longest) one wins. Two mappings claiming the same root are a
//! configuration error; the table keeps the first-registered entry and
//! logs a warning at construction time.

use std::path::Path;

use tracing::warn;

use s3mirror_core::domain::SyncMapping;

/// Remote destination for a resolved path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    /// Credential profile of the owning mapping
    pub profile: String,
    /// Target bucket
    pub bucket: String,
    /// Full object key (mapping prefix + relative key)
    pub key: String,
}

/// Immutable lookup table over the configured sync mappings
///
/// Built once at engine startup from the mapping store snapshot and
/// never mutated during a run.
pub struct MappingTable {
    mappings: Vec<SyncMapping>,
}

impl MappingTable {
    /// Builds the table, dropping duplicate roots in favor of the
    /// first-registered entry.
    pub fn new(mappings: Vec<SyncMapping>) -> Self {
        let mut kept: Vec<SyncMapping> = Vec::with_capacity(mappings.len());
        for mapping in mappings {
            if kept.iter().any(|m| m.local_root == mapping.local_root) {
                warn!(
                    root = %mapping.local_root.display(),
                    profile = %mapping.profile,
                    bucket = %mapping.bucket,
                    "Duplicate sync root in configuration, keeping the first-registered entry"
                );
                continue;
            }
            kept.push(mapping);
        }
        Self { mappings: kept }
    }

    /// Iterates the configured local roots (deduplicated, in
    /// registration order).
    pub fn roots(&self) -> impl Iterator<Item = &Path> {
        self.mappings.iter().map(|m| m.local_root.as_path())
    }

    /// Resolves a changed path to its remote destination
    ///
    /// Returns `None` (not mapped) if no configured root is a
    /// component-wise prefix of `path`; the caller then ignores the
    /// event. The object key uses forward slashes regardless of the
    /// local path separator.
    pub fn resolve(&self, path: &Path) -> Option<Destination> {
        let mut best: Option<&SyncMapping> = None;
        for mapping in &self.mappings {
            if !path.starts_with(&mapping.local_root) {
                continue;
            }
            // Longest root wins; on the (impossible after dedup) tie,
            // the earlier entry is kept.
            let better = match best {
                None => true,
                Some(current) => {
                    mapping.local_root.as_os_str().len() > current.local_root.as_os_str().len()
                }
            };
            if better {
                best = Some(mapping);
            }
        }

        let mapping = best?;
        let relative = mapping.relative_key(path)?;
        Some(Destination {
            profile: mapping.profile.clone(),
            bucket: mapping.bucket.clone(),
            key: mapping.object_key(&relative),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn mapping(root: &str, profile: &str, bucket: &str, prefix: &str) -> SyncMapping {
        SyncMapping {
            local_root: PathBuf::from(root),
            profile: profile.to_string(),
            bucket: bucket.to_string(),
            key_prefix: prefix.to_string(),
        }
    }

    #[test]
    fn test_resolve_simple() {
        let table = MappingTable::new(vec![mapping("/data", "p1", "b1", "")]);
        let dest = table.resolve(Path::new("/data/x.txt")).unwrap();
        assert_eq!(
            dest,
            Destination {
                profile: "p1".to_string(),
                bucket: "b1".to_string(),
                key: "x.txt".to_string(),
            }
        );
    }

    #[test]
    fn test_resolve_nested_key_uses_forward_slashes() {
        let table = MappingTable::new(vec![mapping("/data", "p1", "b1", "backup")]);
        let dest = table.resolve(Path::new("/data/sub/deep/x.txt")).unwrap();
        assert_eq!(dest.key, "backup/sub/deep/x.txt");
    }

    #[test]
    fn test_resolve_not_mapped() {
        let table = MappingTable::new(vec![mapping("/data", "p1", "b1", "")]);
        assert!(table.resolve(Path::new("/other/x.txt")).is_none());
    }

    #[test]
    fn test_resolve_is_separator_aware() {
        // /data/ab must not match the root /data/a
        let table = MappingTable::new(vec![mapping("/data/a", "p1", "b1", "")]);
        assert!(table.resolve(Path::new("/data/ab")).is_none());
        assert!(table.resolve(Path::new("/data/a/x")).is_some());
    }

    #[test]
    fn test_longest_root_wins() {
        let table = MappingTable::new(vec![
            mapping("/data", "p1", "outer", ""),
            mapping("/data/inner", "p2", "inner", ""),
        ]);

        let dest = table.resolve(Path::new("/data/inner/x.txt")).unwrap();
        assert_eq!(dest.bucket, "inner");
        assert_eq!(dest.key, "x.txt");

        // Order of registration must not matter for specificity
        let table = MappingTable::new(vec![
            mapping("/data/inner", "p2", "inner", ""),
            mapping("/data", "p1", "outer", ""),
        ]);
        let dest = table.resolve(Path::new("/data/inner/x.txt")).unwrap();
        assert_eq!(dest.bucket, "inner");

        let dest = table.resolve(Path::new("/data/y.txt")).unwrap();
        assert_eq!(dest.bucket, "outer");
    }

    #[test]
    fn test_duplicate_root_keeps_first_registered() {
        let table = MappingTable::new(vec![
            mapping("/data", "p1", "first", ""),
            mapping("/data", "p2", "second", ""),
        ]);
        let dest = table.resolve(Path::new("/data/x.txt")).unwrap();
        assert_eq!(dest.bucket, "first");
        assert_eq!(table.roots().count(), 1);
    }

    #[test]
    fn test_resolve_root_itself_yields_prefix() {
        let table = MappingTable::new(vec![mapping("/data", "p1", "b1", "backup")]);
        let dest = table.resolve(Path::new("/data")).unwrap();
        assert_eq!(dest.key, "backup");
    }
}
