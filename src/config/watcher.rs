//! Configuration file watcher for hot reload.
//!
//! # Data Flow
//! ```text
//! notify event for the rules file ──▶ raw change ──▶ settle() ──▶ settled change
//!                                       (burst)      (quiet period)   (one per burst)
//! ```
//!
//! # Design Decisions
//! - The watcher never reads the file; it only reports that it changed
//! - A save is truncate then write, so a burst of events is collapsed and
//!   reported once the file has been quiet for the configured interval

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

/// A watcher that monitors the configuration file for changes.
///
/// The parent directory is watched so that editors which replace the file
/// (write to a temporary file, then rename) are still noticed.
pub struct ConfigWatcher {
    path: PathBuf,
    quiet: Duration,
    changed_tx: mpsc::UnboundedSender<()>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver that yields once per settled
    /// change, after `quiet` has passed without further events.
    pub fn new(path: &Path, quiet: Duration) -> (Self, mpsc::UnboundedReceiver<()>) {
        let (changed_tx, changed_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                quiet,
                changed_tx,
            },
            changed_rx,
        )
    }

    /// Start watching. The returned watcher must be kept alive; dropping it
    /// also ends the settling task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let file_name = self.path.file_name().map(|n| n.to_os_string());

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !(event.kind.is_modify() || event.kind.is_create()) {
                        return;
                    }
                    let ours = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if ours {
                        let _ = raw_tx.send(());
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            // Only used when the platform falls back to polling.
            Config::default().with_poll_interval(self.quiet),
        )?;

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tokio::spawn(settle(raw_rx, self.changed_tx, self.quiet));

        tracing::info!(path = ?self.path, quiet_ms = self.quiet.as_millis() as u64, "Config watcher started");
        Ok(watcher)
    }
}

/// Forward one `settled` signal per burst of `raw` signals, once `quiet`
/// has passed since the last one. Ends when either side is closed.
pub(crate) async fn settle(
    mut raw: mpsc::UnboundedReceiver<()>,
    settled: mpsc::UnboundedSender<()>,
    quiet: Duration,
) {
    while raw.recv().await.is_some() {
        loop {
            match tokio::time::timeout(quiet, raw.recv()).await {
                Ok(Some(())) => continue,
                Ok(None) => return,
                Err(_) => break,
            }
        }
        tracing::debug!("Config file settled");
        if settled.send(()).is_err() {
            return;
        }
    }
}
