//! Startup orchestration and the reload loop.
//!
//! # Responsibilities
//! - Load the configuration and publish the first rule set
//! - Start the reload triggers (file watcher, SIGHUP, explicit requests)
//! - Apply reload requests one at a time until shutdown
//!
//! # Design Decisions
//! - Fail fast: an unusable configuration at startup is fatal
//! - After startup, reload failures are logged and the rules stay as they were
//! - A single task applies reloads, so they never overlap
//! - Reading and compiling run on the blocking pool, off the async workers

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::RecommendedWatcher;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::config::loader::{build_repository, load_repository, LoadError};
use crate::config::schema::RouterConfig;
use crate::config::watcher::ConfigWatcher;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::{spawn_reload_signal, ReloadRequest};
use crate::routing::store::RuleStore;

/// Load `path` and return a `Ready` store with its rules.
pub fn load_initial(path: &Path) -> Result<(RouterConfig, Arc<RuleStore>), LoadError> {
    let (config, repo) = load_repository(path)?;
    tracing::info!(
        path = ?path,
        targets = repo.target_count(),
        rules = repo.rule_count(),
        "Routing rules loaded"
    );
    Ok((config, Arc::new(RuleStore::with_repository(repo))))
}

/// Apply one request to the store. Errors are logged by the store.
pub fn apply_request(store: &RuleStore, path: &Path, request: ReloadRequest) -> bool {
    let result = match request {
        ReloadRequest::Reread => store
            .reload_with(|| load_repository(path).map(|(_, repo)| repo))
            .map(|_| ()),
        ReloadRequest::Apply(config) => store
            .reload_with(|| build_repository(&config))
            .map(|_| ()),
    };
    result.is_ok()
}

/// Running reload machinery. Dropping it stops file watching.
pub struct Reloader {
    requests: mpsc::UnboundedSender<ReloadRequest>,
    task: JoinHandle<()>,
    _watcher: Option<RecommendedWatcher>,
}

impl Reloader {
    /// Start the reload loop and its triggers for `store`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(
        store: Arc<RuleStore>,
        path: PathBuf,
        config: &RouterConfig,
        shutdown: &Shutdown,
    ) -> std::io::Result<Self> {
        let (requests, mut request_rx) = mpsc::unbounded_channel();

        let (watcher, mut change_rx) = if config.reload.watch {
            let quiet = Duration::from_secs(config.reload.poll_interval_secs);
            let (watcher, rx) = ConfigWatcher::new(&path, quiet);
            let watcher = watcher.run().map_err(std::io::Error::other)?;
            (Some(watcher), Some(rx))
        } else {
            (None, None)
        };

        spawn_reload_signal(requests.clone(), shutdown.subscribe())?;

        let mut stop: broadcast::Receiver<()> = shutdown.subscribe();
        let task = tokio::spawn(async move {
            loop {
                let request = tokio::select! {
                    Some(request) = request_rx.recv() => request,
                    Some(()) = next_change(&mut change_rx) => {
                        tracing::info!(path = ?path, "Config file change detected, reloading...");
                        ReloadRequest::Reread
                    }
                    _ = stop.recv() => break,
                };
                let (job_store, job_path) = (store.clone(), path.clone());
                let job = tokio::task::spawn_blocking(move || apply_request(&job_store, &job_path, request));
                if let Err(e) = job.await {
                    tracing::error!(error = %e, "Reload job failed");
                }
            }
            tracing::info!("Reload loop stopped");
        });

        Ok(Self {
            requests,
            task,
            _watcher: watcher,
        })
    }

    /// Queue a reload from disk (control-plane trigger).
    pub fn request_reload(&self) -> bool {
        self.requests.send(ReloadRequest::Reread).is_ok()
    }

    /// Queue a reload from an already parsed configuration.
    pub fn request_apply(&self, config: RouterConfig) -> bool {
        self.requests
            .send(ReloadRequest::Apply(Box::new(config)))
            .is_ok()
    }

    /// Wait for the loop to finish after shutdown was triggered.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

async fn next_change(rx: &mut Option<mpsc::UnboundedReceiver<()>>) -> Option<()> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
