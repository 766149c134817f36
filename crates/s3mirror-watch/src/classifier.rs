//! Event classification
//!
//! Two stages separate "what the OS said" from "what the mirror must
//! do": [`map_notify_event`] converts raw `notify` events into the
//! internal [`FsEvent`] model, and [`classify`] turns an [`FsEvent`]
//! into a semantic [`Action`] using a stat call to disambiguate files
//! from directories.
//!
//! Renames deserve a note: the notification source delivers the old
//! path (rename-from) and the new path (rename-to) as separate events
//! that it does not reliably correlate across platforms. The classifier
//! therefore treats a rename-from exactly like a remove, and the paired
//! rename-to like a create that re-uploads under the new path. The
//! renamed content is briefly absent remotely between the two events;
//! that is the accepted best-effort semantics.

use std::fs;
use std::path::PathBuf;

use notify::event::{ModifyKind, RenameMode};
use notify::EventKind;
use tracing::debug;

/// Internal filesystem event, decoupled from the `notify` crate's raw
/// event types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    /// Absolute path the event refers to
    pub path: PathBuf,
    /// What happened at that path
    pub kind: FsEventKind,
}

/// The four raw event shapes the engine reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsEventKind {
    /// A file or directory appeared (including the rename-to half of a move)
    Created,
    /// A file's content or metadata changed
    Modified,
    /// A file or directory was deleted
    Removed,
    /// A file or directory was renamed away; only the old path is known
    RenamedAway,
}

/// Semantic action derived from one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Upload a single file (create and modify are the same remote
    /// operation: an overwriting put)
    UploadFile(PathBuf),
    /// A pre-populated directory appeared: watch every directory in its
    /// subtree and upload every contained file in one combined walk.
    /// Only one Create event fires for the top-level entry when a whole
    /// tree is moved into a watched root, so the per-file events cannot
    /// be relied on.
    UploadDirRecursive(PathBuf),
    /// An empty directory appeared: register the watch, emit no remote
    /// operation (object stores need no empty prefixes)
    WatchDir(PathBuf),
    /// Remove the path's watches and delete the remote prefix; covers
    /// files, directories, and the rename-away half of a move uniformly
    DeletePrefix(PathBuf),
    /// Nothing to do
    None,
}

/// Converts a raw `notify::Event` into zero or more [`FsEvent`]s
///
/// - `Create(*)` -> `Created`
/// - `Modify(Data(*))` and other `Modify(*)` -> `Modified`
/// - `Modify(Name(From))` -> `RenamedAway`
/// - `Modify(Name(To))` -> `Created`
/// - `Modify(Name(Both))` with two paths -> `RenamedAway` + `Created`
/// - `Remove(*)` -> `Removed`
/// - Access and other kinds are ignored.
pub fn map_notify_event(event: &notify::Event) -> Vec<FsEvent> {
    let paths = &event.paths;

    match &event.kind {
        EventKind::Create(_) => paths
            .first()
            .map(|p| {
                vec![FsEvent {
                    path: p.clone(),
                    kind: FsEventKind::Created,
                }]
            })
            .unwrap_or_default(),

        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => paths
            .first()
            .map(|p| {
                vec![FsEvent {
                    path: p.clone(),
                    kind: FsEventKind::RenamedAway,
                }]
            })
            .unwrap_or_default(),

        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => paths
            .first()
            .map(|p| {
                vec![FsEvent {
                    path: p.clone(),
                    kind: FsEventKind::Created,
                }]
            })
            .unwrap_or_default(),

        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if paths.len() >= 2 => {
            vec![
                FsEvent {
                    path: paths[0].clone(),
                    kind: FsEventKind::RenamedAway,
                },
                FsEvent {
                    path: paths[1].clone(),
                    kind: FsEventKind::Created,
                },
            ]
        }

        EventKind::Modify(_) => paths
            .first()
            .map(|p| {
                vec![FsEvent {
                    path: p.clone(),
                    kind: FsEventKind::Modified,
                }]
            })
            .unwrap_or_default(),

        EventKind::Remove(_) => paths
            .first()
            .map(|p| {
                vec![FsEvent {
                    path: p.clone(),
                    kind: FsEventKind::Removed,
                }]
            })
            .unwrap_or_default(),

        _ => {
            debug!(kind = ?event.kind, "Ignoring event kind");
            Vec::new()
        }
    }
}

/// Maps an [`FsEvent`] to its semantic [`Action`]
///
/// Create and Modify stat the path to distinguish files from
/// directories; a failed stat means the path vanished between the event
/// and now and the event is dropped (recoverable-per-path). Remove and
/// RenamedAway never stat: the path is already gone.
pub fn classify(event: &FsEvent) -> Action {
    match event.kind {
        FsEventKind::Created => match fs::metadata(&event.path) {
            Ok(meta) if meta.is_dir() => {
                if dir_is_empty(&event.path) {
                    Action::WatchDir(event.path.clone())
                } else {
                    Action::UploadDirRecursive(event.path.clone())
                }
            }
            Ok(_) => Action::UploadFile(event.path.clone()),
            Err(err) => {
                debug!(
                    path = %event.path.display(),
                    error = %err,
                    "Created path vanished before stat, ignoring"
                );
                Action::None
            }
        },

        FsEventKind::Modified => match fs::metadata(&event.path) {
            // Directory content changes arrive as separate per-entry
            // events; a Write on the directory itself is redundant.
            Ok(meta) if meta.is_dir() => Action::None,
            Ok(_) => Action::UploadFile(event.path.clone()),
            Err(err) => {
                debug!(
                    path = %event.path.display(),
                    error = %err,
                    "Modified path vanished before stat, ignoring"
                );
                Action::None
            }
        },

        FsEventKind::Removed | FsEventKind::RenamedAway => {
            Action::DeletePrefix(event.path.clone())
        }
    }
}

/// True when the directory has no entries. Unreadable directories count
/// as non-empty so the recursive walk gets a chance to handle them.
fn dir_is_empty(path: &std::path::Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn event(path: &Path, kind: FsEventKind) -> FsEvent {
        FsEvent {
            path: path.to_path_buf(),
            kind,
        }
    }

    // ------------------------------------------------------------------
    // classify
    // ------------------------------------------------------------------

    #[test]
    fn test_create_file_is_upload() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, b"x").unwrap();

        assert_eq!(
            classify(&event(&file, FsEventKind::Created)),
            Action::UploadFile(file)
        );
    }

    #[test]
    fn test_create_empty_dir_is_watch_only() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();

        assert_eq!(
            classify(&event(&sub, FsEventKind::Created)),
            Action::WatchDir(sub)
        );
    }

    #[test]
    fn test_create_populated_dir_is_recursive_upload() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("a.txt"), b"x").unwrap();

        assert_eq!(
            classify(&event(&sub, FsEventKind::Created)),
            Action::UploadDirRecursive(sub)
        );
    }

    #[test]
    fn test_create_vanished_path_is_none() {
        let gone = Path::new("/nonexistent/s3mirror-test/a.txt");
        assert_eq!(classify(&event(gone, FsEventKind::Created)), Action::None);
    }

    #[test]
    fn test_modify_file_is_upload() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, b"x").unwrap();

        assert_eq!(
            classify(&event(&file, FsEventKind::Modified)),
            Action::UploadFile(file)
        );
    }

    #[test]
    fn test_modify_dir_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            classify(&event(dir.path(), FsEventKind::Modified)),
            Action::None
        );
    }

    #[test]
    fn test_remove_and_rename_away_are_delete_prefix() {
        let gone = Path::new("/data/removed");
        assert_eq!(
            classify(&event(gone, FsEventKind::Removed)),
            Action::DeletePrefix(gone.to_path_buf())
        );
        assert_eq!(
            classify(&event(gone, FsEventKind::RenamedAway)),
            Action::DeletePrefix(gone.to_path_buf())
        );
    }

    // ------------------------------------------------------------------
    // map_notify_event
    // ------------------------------------------------------------------

    fn raw(kind: EventKind, paths: Vec<PathBuf>) -> notify::Event {
        notify::Event {
            kind,
            paths,
            attrs: Default::default(),
        }
    }

    #[test]
    fn test_map_create() {
        let mapped = map_notify_event(&raw(
            EventKind::Create(notify::event::CreateKind::File),
            vec![PathBuf::from("/a.txt")],
        ));
        assert_eq!(
            mapped,
            vec![event(Path::new("/a.txt"), FsEventKind::Created)]
        );
    }

    #[test]
    fn test_map_modify_data() {
        let mapped = map_notify_event(&raw(
            EventKind::Modify(ModifyKind::Data(notify::event::DataChange::Content)),
            vec![PathBuf::from("/a.txt")],
        ));
        assert_eq!(
            mapped,
            vec![event(Path::new("/a.txt"), FsEventKind::Modified)]
        );
    }

    #[test]
    fn test_map_rename_from_and_to() {
        let mapped = map_notify_event(&raw(
            EventKind::Modify(ModifyKind::Name(RenameMode::From)),
            vec![PathBuf::from("/old.txt")],
        ));
        assert_eq!(
            mapped,
            vec![event(Path::new("/old.txt"), FsEventKind::RenamedAway)]
        );

        let mapped = map_notify_event(&raw(
            EventKind::Modify(ModifyKind::Name(RenameMode::To)),
            vec![PathBuf::from("/new.txt")],
        ));
        assert_eq!(
            mapped,
            vec![event(Path::new("/new.txt"), FsEventKind::Created)]
        );
    }

    #[test]
    fn test_map_rename_both_splits_into_two_events() {
        let mapped = map_notify_event(&raw(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            vec![PathBuf::from("/old.txt"), PathBuf::from("/new.txt")],
        ));
        assert_eq!(
            mapped,
            vec![
                event(Path::new("/old.txt"), FsEventKind::RenamedAway),
                event(Path::new("/new.txt"), FsEventKind::Created),
            ]
        );
    }

    #[test]
    fn test_map_remove() {
        let mapped = map_notify_event(&raw(
            EventKind::Remove(notify::event::RemoveKind::Folder),
            vec![PathBuf::from("/gone")],
        ));
        assert_eq!(mapped, vec![event(Path::new("/gone"), FsEventKind::Removed)]);
    }

    #[test]
    fn test_map_access_ignored() {
        let mapped = map_notify_event(&raw(
            EventKind::Access(notify::event::AccessKind::Read),
            vec![PathBuf::from("/a.txt")],
        ));
        assert!(mapped.is_empty());
    }

    #[test]
    fn test_map_event_without_paths_ignored() {
        let mapped = map_notify_event(&raw(
            EventKind::Create(notify::event::CreateKind::File),
            vec![],
        ));
        assert!(mapped.is_empty());
    }
}
