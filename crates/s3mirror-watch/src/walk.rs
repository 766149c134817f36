//! Pure directory traversal
//!
//! Produces a flat list of `(path, is_directory)` pairs for a subtree,
//! consumed by the watch set manager (to register directories) and the
//! event classifier (to upload the files of a pre-populated directory).
//! Keeping the traversal free of side effects keeps both consumers
//! independently testable.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Walks the tree rooted at `root` breadth-first, returning every entry
/// including `root` itself.
///
/// A missing root yields an empty list. Unreadable directories and
/// failed stat calls are skipped with a debug log; the walk never
/// aborts on a partial error.
pub fn walk_tree(root: &Path) -> Vec<(PathBuf, bool)> {
    let mut entries = Vec::new();

    let meta = match fs::metadata(root) {
        Ok(m) => m,
        Err(err) => {
            debug!(path = %root.display(), error = %err, "Walk root not accessible, skipping");
            return entries;
        }
    };

    entries.push((root.to_path_buf(), meta.is_dir()));
    if !meta.is_dir() {
        return entries;
    }

    let mut queue = VecDeque::from([root.to_path_buf()]);
    while let Some(dir) = queue.pop_front() {
        let read = match fs::read_dir(&dir) {
            Ok(read) => read,
            Err(err) => {
                debug!(path = %dir.display(), error = %err, "Unreadable directory, skipping subtree");
                continue;
            }
        };

        for entry in read {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    debug!(path = %dir.display(), error = %err, "Unreadable entry, skipping");
                    continue;
                }
            };
            let path = entry.path();
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            entries.push((path.clone(), is_dir));
            if is_dir {
                queue.push_back(path);
            }
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_missing_root_is_empty() {
        assert!(walk_tree(Path::new("/nonexistent/s3mirror-test")).is_empty());
    }

    #[test]
    fn test_walk_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, b"hello").unwrap();

        let entries = walk_tree(&file);
        assert_eq!(entries, vec![(file, false)]);
    }

    #[test]
    fn test_walk_nested_tree() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        fs::create_dir_all(root.join("sub/inner")).unwrap();
        fs::write(root.join("a.txt"), b"a").unwrap();
        fs::write(root.join("sub/b.txt"), b"b").unwrap();
        fs::write(root.join("sub/inner/c.txt"), b"c").unwrap();

        let entries = walk_tree(&root);

        let dirs: Vec<_> = entries.iter().filter(|(_, d)| *d).map(|(p, _)| p).collect();
        let files: Vec<_> = entries.iter().filter(|(_, d)| !*d).map(|(p, _)| p).collect();

        assert_eq!(dirs.len(), 3);
        assert!(dirs.contains(&&root));
        assert!(dirs.contains(&&root.join("sub")));
        assert!(dirs.contains(&&root.join("sub/inner")));

        assert_eq!(files.len(), 3);
        assert!(files.contains(&&root.join("sub/inner/c.txt")));
    }

    #[test]
    fn test_walk_empty_dir_is_just_root() {
        let dir = tempfile::tempdir().unwrap();
        let entries = walk_tree(dir.path());
        assert_eq!(entries, vec![(dir.path().to_path_buf(), true)]);
    }
}
