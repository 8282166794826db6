//! In-memory store backend.

use super::ConfigStore;
use crate::Result;
use crate::configs::{AffectedRepo, Configs, RepoId};
use crate::manifest::OwlBotLock;
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Default)]
struct State {
    configs: HashMap<RepoId, Configs>,
    triggered: HashMap<(RepoId, String), String>,
}

/// [`ConfigStore`] backed by process-local maps.
///
/// Both primitives run under one mutex, so compare-and-set and
/// record-if-absent are atomic. Suitable for tests and single-process
/// embedders; durability is up to the backend that replaces it.
#[derive(Default)]
pub struct MemoryConfigStore {
    state: Mutex<State>,
}

impl MemoryConfigStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn get_configs(&self, repo: &RepoId) -> Result<Option<Configs>> {
        let state = self.state.lock().await;
        Ok(state.configs.get(repo).cloned())
    }

    async fn compare_and_set(
        &self,
        repo: &RepoId,
        new_configs: Configs,
        expected_prior_commit: Option<&str>,
    ) -> Result<bool> {
        let mut state = self.state.lock().await;
        let current = state.configs.get(repo).map(|c| c.commit_hash.as_str());
        if current != expected_prior_commit {
            debug!(
                repo = %repo,
                expected = ?expected_prior_commit,
                found = ?current,
                "compare-and-set rejected"
            );
            return Ok(false);
        }
        state.configs.insert(repo.clone(), new_configs);
        Ok(true)
    }

    async fn find_affected_by(&self, changed_paths: &[String]) -> Result<Vec<AffectedRepo>> {
        let state = self.state.lock().await;
        let mut affected = Vec::new();
        for (repo, configs) in &state.configs {
            if references_any(configs, changed_paths) {
                affected.push(AffectedRepo {
                    repo: repo.clone(),
                    configs: configs.clone(),
                });
            }
        }
        affected.sort_by(|a, b| a.repo.to_string().cmp(&b.repo.to_string()));
        Ok(affected)
    }

    async fn find_by_post_processor_image(&self, image: &str) -> Result<Vec<AffectedRepo>> {
        let state = self.state.lock().await;
        let mut affected: Vec<AffectedRepo> = state
            .configs
            .iter()
            .filter(|(_, configs)| {
                configs.yamls.as_deref().unwrap_or_default().iter().any(|f| {
                    f.yaml
                        .docker
                        .as_ref()
                        .is_some_and(|docker| docker.image == image)
                })
            })
            .map(|(repo, configs)| AffectedRepo {
                repo: repo.clone(),
                configs: configs.clone(),
            })
            .collect();
        affected.sort_by(|a, b| a.repo.to_string().cmp(&b.repo.to_string()));
        Ok(affected)
    }

    async fn clear_configs(&self, repo: &RepoId) -> Result<()> {
        let mut state = self.state.lock().await;
        state.configs.remove(repo);
        Ok(())
    }

    async fn find_triggered_build(
        &self,
        repo: &RepoId,
        lock: &OwlBotLock,
    ) -> Result<Option<String>> {
        let state = self.state.lock().await;
        Ok(state
            .triggered
            .get(&(repo.clone(), lock.container()))
            .cloned())
    }

    async fn record_triggered_build(
        &self,
        repo: &RepoId,
        lock: &OwlBotLock,
        handle: String,
    ) -> Result<String> {
        let mut state = self.state.lock().await;
        let recorded = state
            .triggered
            .entry((repo.clone(), lock.container()))
            .or_insert(handle);
        Ok(recorded.clone())
    }
}

/// Whether any of `configs`' copy-rule sources match any changed path.
///
/// Stored patterns were validated at extraction time, but a record written
/// by an older version may still hold an invalid one; those are skipped.
fn references_any(configs: &Configs, changed_paths: &[String]) -> bool {
    for file in configs.yamls.as_deref().unwrap_or_default() {
        for rule in &file.yaml.deep_copy_regex {
            let Ok(pattern) = Regex::new(&rule.source) else {
                continue;
            };
            if changed_paths.iter().any(|path| pattern.is_match(path)) {
                return true;
            }
        }
    }
    false
}
