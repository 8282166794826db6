//! The configuration store contract.
//!
//! The store is the only shared mutable resource in the system. All mutation
//! goes through two primitives: an optimistic compare-and-set keyed on the
//! stored commit hash, and an idempotent record-if-absent for triggered
//! builds. Any backend that implements these atomically (in-memory map,
//! document database, key-value store) satisfies the rest of the system
//! unchanged; test doubles implement the same trait.

mod memory;

pub use memory::MemoryConfigStore;

use crate::Result;
use crate::configs::{AffectedRepo, Configs, RepoId};
use crate::manifest::OwlBotLock;
use async_trait::async_trait;

/// Persistent mapping from repository to its current [`Configs`] record,
/// plus the `(repo, lock)` → build-handle map used for trigger dedup.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Fetch the current record for a repository, if any.
    async fn get_configs(&self, repo: &RepoId) -> Result<Option<Configs>>;

    /// Write `new_configs` iff the stored commit hash equals
    /// `expected_prior_commit` (or the repository has no record, when the
    /// expectation is `None`).
    ///
    /// Returns whether the write took effect. `false` means the caller lost
    /// a race to a newer write; its computed update must be discarded, never
    /// merged. This is the sole mutation path for config records.
    async fn compare_and_set(
        &self,
        repo: &RepoId,
        new_configs: Configs,
        expected_prior_commit: Option<&str>,
    ) -> Result<bool>;

    /// Repositories whose stored configs reference any of the changed paths
    /// (reverse index over `deep-copy-regex` sources).
    async fn find_affected_by(&self, changed_paths: &[String]) -> Result<Vec<AffectedRepo>>;

    /// Repositories whose stored configs name `image` as their
    /// post-processor container.
    async fn find_by_post_processor_image(&self, image: &str) -> Result<Vec<AffectedRepo>>;

    /// Remove a repository's record.
    async fn clear_configs(&self, repo: &RepoId) -> Result<()>;

    /// The build handle recorded for `(repo, lock)`, if one exists.
    async fn find_triggered_build(
        &self,
        repo: &RepoId,
        lock: &OwlBotLock,
    ) -> Result<Option<String>>;

    /// Record `handle` for `(repo, lock)` unless one is already recorded.
    ///
    /// Idempotent set: returns the value now on record, which may be the
    /// caller's or one written by a concurrent racer. Callers must not
    /// assume their own value won.
    async fn record_triggered_build(
        &self,
        repo: &RepoId,
        lock: &OwlBotLock,
        handle: String,
    ) -> Result<String>;
}
