//! Watch set manager
//!
//! Owns the live set of per-directory watch registrations. The
//! underlying OS mechanism is not inherently recursive, so the manager
//! walks subtrees itself and registers every directory it finds; files
//! never receive a watch of their own (their events fire via the parent
//! directory's watch).
//!
//! [`WatchSet`] is the only component allowed to mutate the underlying
//! registration, and all mutation happens on the engine's event loop,
//! so no locking is needed.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use crate::walk::walk_tree;

/// The set of directories currently registered with the OS notification
/// mechanism
///
/// Invariant: for every configured sync root that exists on disk, every
/// directory of its subtree is registered exactly once.
pub struct WatchSet {
    /// The underlying notify watcher, used in non-recursive mode
    watcher: RecommendedWatcher,
    /// Absolute paths of currently registered directories
    watched: HashSet<PathBuf>,
}

impl WatchSet {
    /// Wraps a notify watcher. The watcher must have been created in
    /// whatever callback configuration the caller needs; the set only
    /// drives registration.
    pub fn new(watcher: RecommendedWatcher) -> Self {
        Self {
            watcher,
            watched: HashSet::new(),
        }
    }

    /// Walks the tree rooted at `root` and registers every directory,
    /// including `root` itself.
    ///
    /// A missing root and unreadable subtrees are tolerated: the walk
    /// skips them and continues with siblings. Files in the tree are
    /// ignored.
    pub fn add_recursive(&mut self, root: &Path) {
        for (path, is_dir) in walk_tree(root) {
            if is_dir {
                self.add_dir(&path);
            }
        }
    }

    /// Registers a single directory watch
    ///
    /// Already-registered paths are a no-op, keeping the exactly-once
    /// invariant when trees are partially watched. Registration
    /// failures are logged and skipped; one bad directory must not take
    /// down the engine.
    pub fn add_dir(&mut self, path: &Path) {
        if self.watched.contains(path) {
            return;
        }
        match self.watcher.watch(path, RecursiveMode::NonRecursive) {
            Ok(()) => {
                debug!(path = %path.display(), "Watch registered");
                self.watched.insert(path.to_path_buf());
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Failed to register watch");
            }
        }
    }

    /// Unregisters every watched path equal to or nested under `root`
    ///
    /// Idempotent: removing a root twice, or one that was never added,
    /// is a no-op. Unwatch errors are expected when the directory has
    /// already been deleted (the kernel drops the watch with it) and
    /// are logged at debug level only.
    pub fn remove_recursive(&mut self, root: &Path) {
        let doomed: Vec<PathBuf> = self
            .watched
            .iter()
            .filter(|p| p.starts_with(root))
            .cloned()
            .collect();

        for path in doomed {
            if let Err(err) = self.watcher.unwatch(&path) {
                debug!(path = %path.display(), error = %err, "Unwatch failed, path likely already gone");
            }
            self.watched.remove(&path);
            debug!(path = %path.display(), "Watch removed");
        }
    }

    /// Whether `path` is currently registered.
    pub fn contains(&self, path: &Path) -> bool {
        self.watched.contains(path)
    }

    /// Number of registered directories.
    pub fn len(&self) -> usize {
        self.watched.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.watched.is_empty()
    }

    /// Currently registered paths, in no particular order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.watched.iter().map(|p| p.as_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn watch_set() -> WatchSet {
        let watcher = RecommendedWatcher::new(|_| {}, notify::Config::default()).unwrap();
        WatchSet::new(watcher)
    }

    #[test]
    fn test_add_recursive_registers_all_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::create_dir_all(root.join("c")).unwrap();
        fs::write(root.join("a/file.txt"), b"x").unwrap();

        let mut set = watch_set();
        set.add_recursive(&root);

        assert_eq!(set.len(), 4);
        assert!(set.contains(&root));
        assert!(set.contains(&root.join("a")));
        assert!(set.contains(&root.join("a/b")));
        assert!(set.contains(&root.join("c")));
        // Files are never watched
        assert!(!set.contains(&root.join("a/file.txt")));
    }

    #[test]
    fn test_add_then_remove_leaves_set_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let outside = dir.path().join("outside");
        let root = dir.path().join("root");
        fs::create_dir_all(&outside).unwrap();
        fs::create_dir_all(root.join("a/b/c")).unwrap();

        let mut set = watch_set();
        set.add_recursive(&outside);
        let before: HashSet<PathBuf> = set.paths().map(|p| p.to_path_buf()).collect();

        set.add_recursive(&root);
        assert_eq!(set.len(), before.len() + 4);

        set.remove_recursive(&root);
        let after: HashSet<PathBuf> = set.paths().map(|p| p.to_path_buf()).collect();
        assert_eq!(after, before);
    }

    #[test]
    fn test_add_recursive_missing_root_is_noop() {
        let mut set = watch_set();
        set.add_recursive(Path::new("/nonexistent/s3mirror-test"));
        assert!(set.is_empty());
    }

    #[test]
    fn test_add_recursive_file_root_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, b"x").unwrap();

        let mut set = watch_set();
        set.add_recursive(&file);
        assert!(set.is_empty());
    }

    #[test]
    fn test_remove_recursive_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        fs::create_dir_all(root.join("sub")).unwrap();

        let mut set = watch_set();
        set.add_recursive(&root);
        set.remove_recursive(&root);
        assert!(set.is_empty());

        // Second remove, and removal of a never-added root, are no-ops
        set.remove_recursive(&root);
        set.remove_recursive(Path::new("/never/added"));
        assert!(set.is_empty());
    }

    #[test]
    fn test_add_recursive_partially_watched_tree() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        fs::create_dir_all(root.join("sub")).unwrap();

        let mut set = watch_set();
        set.add_recursive(&root.join("sub"));
        assert_eq!(set.len(), 1);

        // Re-walking from the parent must not double-register "sub"
        set.add_recursive(&root);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_remove_recursive_keeps_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        fs::create_dir_all(root.join("keep")).unwrap();
        fs::create_dir_all(root.join("drop/inner")).unwrap();

        let mut set = watch_set();
        set.add_recursive(&root);
        set.remove_recursive(&root.join("drop"));

        assert!(set.contains(&root));
        assert!(set.contains(&root.join("keep")));
        assert!(!set.contains(&root.join("drop")));
        assert!(!set.contains(&root.join("drop/inner")));
    }
}
