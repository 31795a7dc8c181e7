//! Published rule set and its replacement on reload.
//!
//! # Responsibilities
//! - Hold the single published [`Repository`]
//! - Hand out snapshots to evaluations
//! - Serialize reloads and swap in a new repository atomically
//!
//! # Design Decisions
//! - `ArcSwapOption` instead of a read/write lock: readers never block
//! - A snapshot lives as long as the evaluation holding it
//! - A failed reload keeps the previous repository (revert, never retry)
//! - Reloads and direct publishes share one lock, so neither overwrites
//!   the other mid-build

use std::fmt::Display;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arc_swap::ArcSwapOption;

use crate::observability::metrics;
use crate::routing::builder::{build, ConfigError, Directive};
use crate::routing::evaluator::{evaluate, Candidate};
use crate::routing::message::{Message, Peer};
use crate::routing::repository::Repository;

/// Lifecycle state of a [`RuleStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    /// Nothing published yet; every candidate scores 0.
    Uninitialized,
    Ready,
}

/// Reload coordinator owning the published repository.
#[derive(Debug, Default)]
pub struct RuleStore {
    current: ArcSwapOption<Repository>,
    /// Held for the whole build + publish of a reload, and for a publish.
    reload_lock: Mutex<()>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that is already `Ready`.
    pub fn with_repository(repo: Repository) -> Self {
        let store = Self::new();
        store.publish(repo);
        store
    }

    pub fn state(&self) -> StoreState {
        if self.current.load().is_some() {
            StoreState::Ready
        } else {
            StoreState::Uninitialized
        }
    }

    /// Snapshot of the current repository.
    pub fn get_for_read(&self) -> Option<Arc<Repository>> {
        self.current.load_full()
    }

    /// Atomically replace the published repository, returning the old one.
    ///
    /// Waits for any reload in progress, so it is never overwritten by one.
    pub fn publish(&self, repo: Repository) -> Option<Arc<Repository>> {
        let _guard = self.lock_reloads();
        let (_, previous) = self.publish_locked(repo);
        metrics::record_reload(true);
        previous
    }

    /// Build with `build_fn` and publish the result.
    ///
    /// At most one reload or publish runs at a time. On failure the error is
    /// logged, the published repository stays in place, and the error is
    /// returned.
    pub fn reload_with<E, F>(&self, build_fn: F) -> Result<Arc<Repository>, E>
    where
        E: Display,
        F: FnOnce() -> Result<Repository, E>,
    {
        let _guard = self.lock_reloads();

        match build_fn() {
            Ok(repo) => {
                let (repo, _) = self.publish_locked(repo);
                metrics::record_reload(true);
                Ok(repo)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    state = ?self.state(),
                    "Routing rules reload failed, keeping current rules"
                );
                metrics::record_reload(false);
                Err(e)
            }
        }
    }

    fn lock_reloads(&self) -> MutexGuard<'_, ()> {
        self.reload_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Swap in `repo`. Caller holds `reload_lock`.
    fn publish_locked(&self, repo: Repository) -> (Arc<Repository>, Option<Arc<Repository>>) {
        let repo = Arc::new(repo);
        metrics::record_repository(repo.target_count(), repo.rule_count());
        let previous = self.current.swap(Some(repo.clone()));
        tracing::info!(
            targets = repo.target_count(),
            rules = repo.rule_count(),
            first_load = previous.is_none(),
            "Routing rules published"
        );
        (repo, previous)
    }

    /// Rebuild from `directives` and publish.
    pub fn reload(&self, directives: &[Directive]) -> Result<Arc<Repository>, ConfigError> {
        self.reload_with(|| build(directives))
    }

    /// Score `candidates` against the current snapshot.
    ///
    /// Never fails: before the first publish every candidate scores 0.
    pub fn evaluate<'p, M, P>(&self, message: &M, candidates: &'p [P]) -> Vec<Candidate<'p, P>>
    where
        M: Message + ?Sized,
        P: Peer,
    {
        let snapshot = self.current.load();
        match snapshot.as_deref() {
            Some(repo) => evaluate(repo, message, candidates),
            None => candidates.iter().map(|peer| Candidate { peer, score: 0 }).collect(),
        }
    }
}
