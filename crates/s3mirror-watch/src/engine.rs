//! Watcher engine
//!
//! [`WatchEngine::start`] seeds the watch set from the configured
//! mappings and launches a single-threaded event-consumption loop. The
//! loop classifies each event, applies the implied watch-set mutation
//! synchronously, then hands the remote operation to a fire-and-forget
//! task so network latency never blocks event processing.
//!
//! ## Ordering
//!
//! A watch-set mutation triggered by one event is always fully applied
//! before that event's remote call is dispatched and before the next
//! event is classified; this closes the `mkdir -p a/b/c` race where a
//! child's creation could otherwise outrun its parent's registration.
//! Remote calls for different events race freely; the last write
//! observed determines the final remote state.
//!
//! ## Shutdown
//!
//! [`WatchEngineHandle::stop`] cancels the loop, which stops accepting
//! events, waits for every in-flight remote task to complete (the
//! `TaskTracker` drain barrier), and releases the notification resource
//! exactly once. Nothing is cancelled mid-flight.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use notify::{RecommendedWatcher, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use s3mirror_core::domain::SyncMapping;
use s3mirror_core::ports::IObjectStorage;

use crate::classifier::{classify, map_notify_event, Action, FsEvent};
use crate::resolver::{Destination, MappingTable};
use crate::walk::walk_tree;
use crate::watchset::WatchSet;
use crate::WatchError;

/// Capacity of the raw event channel between the notify callback and
/// the event loop.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Entry point for the watcher engine
pub struct WatchEngine;

impl WatchEngine {
    /// Seeds watches for every mapping root and launches the event loop
    ///
    /// Roots that do not exist on disk are tolerated (their subtree is
    /// simply not watched until recreated under a watched parent).
    ///
    /// # Errors
    /// Returns [`WatchError::Init`] if the OS notification backend
    /// cannot be created; this is the only fatal startup condition.
    pub fn start(
        mappings: Vec<SyncMapping>,
        storage: Arc<dyn IObjectStorage>,
    ) -> Result<WatchEngineHandle, WatchError> {
        let (event_tx, event_rx) = mpsc::channel::<FsEvent>(EVENT_CHANNEL_CAPACITY);
        let (error_tx, error_rx) = mpsc::channel::<notify::Error>(16);

        let watcher = RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| match res {
                Ok(raw) => {
                    for event in map_notify_event(&raw) {
                        if event_tx.blocking_send(event).is_err() {
                            // Receiver dropped: the loop is shutting down.
                            break;
                        }
                    }
                }
                Err(err) => {
                    let _ = error_tx.blocking_send(err);
                }
            },
            notify::Config::default(),
        )?;

        let table = MappingTable::new(mappings);
        let mut watches = WatchSet::new(watcher);
        for root in table.roots() {
            watches.add_recursive(root);
        }
        info!(directories = watches.len(), "Seeded watch set from configured roots");

        let state = EngineState {
            table,
            watches,
            storage,
            tracker: TaskTracker::new(),
            failures: Arc::new(AtomicU64::new(0)),
        };

        let shutdown = CancellationToken::new();
        let loop_handle = tokio::spawn(state.run(event_rx, error_rx, shutdown.clone()));

        Ok(WatchEngineHandle {
            shutdown,
            loop_handle,
        })
    }
}

/// Handle to a running engine
///
/// Dropping the handle without calling [`stop`](Self::stop) detaches
/// the loop; it keeps running until its channels close.
pub struct WatchEngineHandle {
    shutdown: CancellationToken,
    loop_handle: JoinHandle<()>,
}

impl WatchEngineHandle {
    /// Raises the shutdown signal and blocks until the loop has drained
    /// every in-flight remote operation and released the notification
    /// resource.
    pub async fn stop(self) {
        self.shutdown.cancel();
        if let Err(err) = self.loop_handle.await {
            warn!(error = %err, "Event loop task panicked during shutdown");
        }
    }
}

/// State owned by the event loop
///
/// The watch set is mutated exclusively here; remote-call tasks only
/// share the storage port and the tracker.
struct EngineState {
    table: MappingTable,
    watches: WatchSet,
    storage: Arc<dyn IObjectStorage>,
    tracker: TaskTracker,
    /// Running count of failed remote operations, for the shutdown
    /// summary. Incremented from dispatch tasks.
    failures: Arc<AtomicU64>,
}

impl EngineState {
    /// The event loop: a three-way wait on events, source errors, and
    /// shutdown, with no priority among ready cases.
    async fn run(
        mut self,
        mut events: mpsc::Receiver<FsEvent>,
        mut errors: mpsc::Receiver<notify::Error>,
        shutdown: CancellationToken,
    ) {
        loop {
            tokio::select! {
                maybe_event = events.recv() => match maybe_event {
                    Some(event) => self.handle_event(event),
                    None => {
                        info!("Event channel closed, stopping");
                        break;
                    }
                },
                maybe_err = errors.recv() => match maybe_err {
                    // Isolated transport errors (e.g. queue overflow) are
                    // logged and survived; only a closed channel ends the loop.
                    Some(err) => warn!(error = %err, "Notification source reported an error"),
                    None => {
                        info!("Error channel closed, stopping");
                        break;
                    }
                },
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested, draining in-flight operations");
                    break;
                }
            }
        }

        self.tracker.close();
        self.tracker.wait().await;
        info!(
            failed_operations = self.failures.load(Ordering::Relaxed),
            "All in-flight remote operations completed"
        );
        // self (and with it the notify watcher) drops here, releasing
        // the notification resource exactly once.
    }

    /// Classifies one event, applies the watch-set mutation, and
    /// dispatches the remote operation.
    ///
    /// Events on paths outside every configured root resolve to
    /// NotMapped and are ignored.
    fn handle_event(&mut self, event: FsEvent) {
        match classify(&event) {
            Action::None => {}

            Action::WatchDir(path) => {
                if self.table.resolve(&path).is_none() {
                    debug!(path = %path.display(), "Event outside configured roots, ignoring");
                    return;
                }
                // Trivial single-entry walk; no remote operation for an
                // empty directory.
                self.watches.add_recursive(&path);
                debug!(path = %path.display(), "Empty directory created, watch registered");
            }

            Action::UploadFile(path) => {
                let Some(dest) = self.table.resolve(&path) else {
                    debug!(path = %path.display(), "Event outside configured roots, ignoring");
                    return;
                };
                self.dispatch_put(dest, path);
            }

            Action::UploadDirRecursive(path) => {
                if self.table.resolve(&path).is_none() {
                    debug!(path = %path.display(), "Event outside configured roots, ignoring");
                    return;
                }
                // One combined walk: a pre-populated tree moved into a
                // watched root fires only this single Create event, so
                // per-file events cannot be relied on. Each directory is
                // registered as it is discovered, before its children
                // are examined.
                for (entry, is_dir) in walk_tree(&path) {
                    if is_dir {
                        self.watches.add_dir(&entry);
                    } else if let Some(dest) = self.table.resolve(&entry) {
                        self.dispatch_put(dest, entry);
                    }
                }
            }

            Action::DeletePrefix(path) => {
                // Watch removal first: a deleted directory must stop
                // generating spurious events before anything else runs.
                self.watches.remove_recursive(&path);
                let Some(dest) = self.table.resolve(&path) else {
                    debug!(path = %path.display(), "Event outside configured roots, ignoring");
                    return;
                };
                self.dispatch_delete(dest, path);
            }
        }
    }

    /// Fires an upload as a tracked fire-and-forget task
    ///
    /// Failures are logged with full context and never retried; one
    /// failed upload must not block unrelated events.
    fn dispatch_put(&self, dest: Destination, local: PathBuf) {
        let storage = Arc::clone(&self.storage);
        let failures = Arc::clone(&self.failures);
        self.tracker.spawn(async move {
            match storage
                .put_object(&dest.profile, &dest.bucket, &dest.key, &local)
                .await
            {
                Ok(()) => {
                    debug!(
                        path = %local.display(),
                        bucket = %dest.bucket,
                        key = %dest.key,
                        "Uploaded object"
                    );
                }
                Err(err) => {
                    failures.fetch_add(1, Ordering::Relaxed);
                    error!(
                        path = %local.display(),
                        bucket = %dest.bucket,
                        key = %dest.key,
                        profile = %dest.profile,
                        error = %err,
                        "Upload failed"
                    );
                }
            }
        });
    }

    /// Fires a delete-prefix as a tracked fire-and-forget task
    fn dispatch_delete(&self, dest: Destination, local: PathBuf) {
        let storage = Arc::clone(&self.storage);
        let failures = Arc::clone(&self.failures);
        self.tracker.spawn(async move {
            match storage
                .delete_prefix(&dest.profile, &dest.bucket, &dest.key)
                .await
            {
                Ok(()) => {
                    debug!(
                        path = %local.display(),
                        bucket = %dest.bucket,
                        key = %dest.key,
                        "Deleted remote prefix"
                    );
                }
                Err(err) => {
                    failures.fetch_add(1, Ordering::Relaxed);
                    error!(
                        path = %local.display(),
                        bucket = %dest.bucket,
                        key = %dest.key,
                        profile = %dest.profile,
                        error = %err,
                        "Remote delete failed"
                    );
                }
            }
        });
    }
}
