//! File watching for settings files that are replaced or edited by a sync agent.

use crate::error::{ConfigError, Result};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

/// Watches one file and emits a signal after each burst of changes settles.
///
/// The parent directory is watched rather than the file itself, so the watch
/// survives sync tools that replace the file by renaming a temporary copy over
/// it. A burst of events closer together than the debounce duration yields a
/// single signal once the burst is over.
///
/// Requires a Tokio runtime.
///
/// # Examples
///
/// ```rust,no_run
/// use roaming_settings::notify::FileWatcher;
/// use std::time::Duration;
///
/// # async fn example() -> roaming_settings::error::Result<()> {
/// let (_watcher, mut rx) = FileWatcher::new("/path/to/settings.json", Duration::from_millis(200))?;
///
/// while let Some(()) = rx.recv().await {
///     println!("settings file changed");
/// }
/// # Ok(())
/// # }
/// ```
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    path: PathBuf,
    debounce_duration: Duration,
}

impl FileWatcher {
    /// Start watching `path`.
    ///
    /// Returns the watcher and the receiving end of the change channel. The
    /// watch stops when the watcher is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist, if no Tokio runtime is
    /// running, or if the platform watcher cannot be created.
    pub fn new(path: impl AsRef<Path>, debounce_duration: Duration) -> Result<(Self, mpsc::Receiver<()>)> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ConfigError::WatchError(format!("No Tokio runtime available: {}", e)))?;

        let path = path
            .as_ref()
            .canonicalize()
            .map_err(|e| ConfigError::WatchError(format!("Failed to resolve path: {}", e)))?;
        let file_name: OsString = path
            .file_name()
            .ok_or_else(|| ConfigError::WatchError(format!("Not a file: {}", path.display())))?
            .to_os_string();
        let directory = path
            .parent()
            .ok_or_else(|| ConfigError::WatchError(format!("No parent directory: {}", path.display())))?
            .to_path_buf();

        let (tx, rx) = mpsc::channel(16);
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<()>();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            if let Ok(event) = res {
                let relevant = matches!(
                    event.kind,
                    notify::EventKind::Modify(_) | notify::EventKind::Create(_)
                ) && event
                    .paths
                    .iter()
                    .any(|p| p.file_name() == Some(file_name.as_os_str()));
                if relevant {
                    let _ = event_tx.send(());
                }
            }
        })
        .map_err(|e| ConfigError::WatchError(format!("Failed to create file watcher: {}", e)))?;

        watcher
            .watch(&directory, RecursiveMode::NonRecursive)
            .map_err(|e| ConfigError::WatchError(format!("Failed to watch path: {}", e)))?;

        // Trailing-edge debounce: one signal per burst.
        runtime.spawn(async move {
            while event_rx.recv().await.is_some() {
                loop {
                    match timeout(debounce_duration, event_rx.recv()).await {
                        Ok(Some(())) => continue,
                        Ok(None) => return,
                        Err(_) => break,
                    }
                }
                if tx.send(()).await.is_err() {
                    break;
                }
            }
        });

        Ok((
            Self {
                _watcher: watcher,
                path,
                debounce_duration,
            },
            rx,
        ))
    }

    /// The canonical path being watched.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the debounce duration for this watcher.
    pub fn debounce_duration(&self) -> Duration {
        self.debounce_duration
    }
}
