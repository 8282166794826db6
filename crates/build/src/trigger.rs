//! The at-most-once build-trigger protocol.

use crate::backend::{CloudBuildClient, Substitutions};
use owlbot_core::{ConfigStore, OwlBotLock, RepoId, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Caller-supplied parameters for one trigger request.
#[derive(Debug, Clone)]
pub struct TriggerParams {
    /// Cloud project that owns the trigger
    pub project_id: String,
    /// Identifier of the configured trigger
    pub trigger_id: String,
    /// Token the build uses to push branches and open pull requests
    pub github_token: String,
    /// Image of the generator CLI the build runs
    pub owl_bot_cli_image: String,
}

/// Guarantees at most one *recorded* build per `(repository, lock)` pair.
pub struct BuildTrigger {
    store: Arc<dyn ConfigStore>,
    builds: Arc<dyn CloudBuildClient>,
}

impl BuildTrigger {
    /// Create a trigger over a store and a build backend.
    #[must_use]
    pub fn new(store: Arc<dyn ConfigStore>, builds: Arc<dyn CloudBuildClient>) -> Self {
        Self { store, builds }
    }

    /// Trigger a lock-regeneration build for `repo` at most once per
    /// distinct lock state.
    ///
    /// After a successful trigger, repeated calls with the same `(repo,
    /// lock)` are pure reads returning the recorded handle. Concurrent
    /// callers converge on one handle: the idempotent record step decides
    /// which one, and a caller's own value may lose.
    ///
    /// Known limitation: the lookup, the build start and the record are not
    /// atomic as a whole, so two callers that both observe no record can
    /// both start a build. Only one handle is ever recorded; the other build
    /// is wasted but harmless (its pull-request branch is the same
    /// deterministic one). Resolving this would need a distributed lock in
    /// the store, which this protocol deliberately does not assume.
    pub async fn trigger_once(
        &self,
        repo: &RepoId,
        lock: &OwlBotLock,
        params: &TriggerParams,
    ) -> Result<String> {
        if let Some(existing) = self.store.find_triggered_build(repo, lock).await? {
            debug!(repo = %repo, container = %lock.container(), handle = %existing,
                "Build already triggered for this lock state");
            return Ok(existing);
        }

        let substitutions = derive_substitutions(repo, lock, params);
        let build_id = self
            .builds
            .create_build(&params.project_id, &params.trigger_id, &substitutions)
            .await?;
        info!(repo = %repo, build_id = %build_id, branch = %substitutions.pr_branch,
            "Started lock-update build");

        // A racer may have recorded first; whatever is on record wins.
        self.store
            .record_triggered_build(repo, lock, build_id)
            .await
    }
}

/// Derive the deterministic substitution set for one `(repo, lock)` pair.
fn derive_substitutions(
    repo: &RepoId,
    lock: &OwlBotLock,
    params: &TriggerParams,
) -> Substitutions {
    Substitutions {
        container: lock.container(),
        github_token: params.github_token.clone(),
        lock_file_path: owlbot_core::manifest::LOCK_FILE_PATH.to_string(),
        owl_bot_cli: params.owl_bot_cli_image.clone(),
        pr_branch: pr_branch_for(&lock.docker.digest),
        pr_owner: repo.owner.clone(),
        repository: repo.name.clone(),
    }
}

/// Pull-request branch name for one digest.
///
/// The digest scheme prefix (`sha256:`) is stripped because `:` is not
/// allowed in git ref names; the remainder keeps retries for the same lock
/// state on the same reviewable branch.
fn pr_branch_for(digest: &str) -> String {
    let hex = digest.split_once(':').map_or(digest, |(_, hex)| hex);
    format!("owl-bot-update-lock-{hex}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use owlbot_core::MemoryConfigStore;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeCloudBuild {
        calls: AtomicUsize,
        last: Mutex<Option<Substitutions>>,
    }

    impl FakeCloudBuild {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                last: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl CloudBuildClient for FakeCloudBuild {
        async fn create_build(
            &self,
            _project_id: &str,
            _trigger_id: &str,
            substitutions: &Substitutions,
        ) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            *self.last.lock().unwrap() = Some(substitutions.clone());
            Ok(format!("build-{n}"))
        }
    }

    fn repo() -> RepoId {
        RepoId::new("googleapis", "nodejs-vision")
    }

    fn lock() -> OwlBotLock {
        OwlBotLock::from_yaml("docker:\n  image: gcr.io/x/y\n  digest: sha256:abcdef\n").unwrap()
    }

    fn params() -> TriggerParams {
        TriggerParams {
            project_id: "my-project".to_string(),
            trigger_id: "trigger-1".to_string(),
            github_token: "token".to_string(),
            owl_bot_cli_image: "gcr.io/repo-automation-bots/owl-bot".to_string(),
        }
    }

    #[tokio::test]
    async fn second_call_is_a_pure_read() {
        let store = Arc::new(MemoryConfigStore::new());
        let builds = Arc::new(FakeCloudBuild::new());
        let trigger = BuildTrigger::new(store, builds.clone());

        let first = trigger.trigger_once(&repo(), &lock(), &params()).await.unwrap();
        let second = trigger.trigger_once(&repo(), &lock(), &params()).await.unwrap();

        assert_eq!(first, "build-1");
        assert_eq!(second, "build-1");
        assert_eq!(builds.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_lock_states_trigger_separately() {
        let store = Arc::new(MemoryConfigStore::new());
        let builds = Arc::new(FakeCloudBuild::new());
        let trigger = BuildTrigger::new(store, builds.clone());

        trigger.trigger_once(&repo(), &lock(), &params()).await.unwrap();
        let other = OwlBotLock::from_yaml(
            "docker:\n  image: gcr.io/x/y\n  digest: sha256:fedcba\n",
        )
        .unwrap();
        trigger.trigger_once(&repo(), &other, &params()).await.unwrap();

        assert_eq!(builds.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn pre_recorded_handle_wins_without_a_build() {
        let store = Arc::new(MemoryConfigStore::new());
        store
            .record_triggered_build(&repo(), &lock(), "https://github.com/g/r/pull/5".to_string())
            .await
            .unwrap();
        let builds = Arc::new(FakeCloudBuild::new());
        let trigger = BuildTrigger::new(store, builds.clone());

        let handle = trigger.trigger_once(&repo(), &lock(), &params()).await.unwrap();

        assert_eq!(handle, "https://github.com/g/r/pull/5");
        assert_eq!(builds.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn substitutions_are_deterministic() {
        let store = Arc::new(MemoryConfigStore::new());
        let builds = Arc::new(FakeCloudBuild::new());
        let trigger = BuildTrigger::new(store, builds.clone());

        trigger.trigger_once(&repo(), &lock(), &params()).await.unwrap();

        let subs = builds.last.lock().unwrap().clone().unwrap();
        assert_eq!(subs.container, "gcr.io/x/y@sha256:abcdef");
        assert_eq!(subs.lock_file_path, ".github/.OwlBot.lock.yaml");
        assert_eq!(subs.pr_branch, "owl-bot-update-lock-abcdef");
        assert_eq!(subs.pr_owner, "googleapis");
        assert_eq!(subs.repository, "nodejs-vision");
        assert_eq!(subs.owl_bot_cli, "gcr.io/repo-automation-bots/owl-bot");
    }

    #[tokio::test]
    async fn racer_recorded_handle_takes_precedence() {
        // Simulate the §known-limitation window: our build started, but a
        // racer recorded its handle before we did.
        let store = Arc::new(MemoryConfigStore::new());
        let builds = Arc::new(FakeCloudBuild::new());
        let trigger = BuildTrigger::new(store.clone(), builds.clone());

        // Racer records between our lookup and our record. Emulate by
        // pre-seeding after confirming the lookup path would miss.
        assert!(
            store
                .find_triggered_build(&repo(), &lock())
                .await
                .unwrap()
                .is_none()
        );
        store
            .record_triggered_build(&repo(), &lock(), "racer-build".to_string())
            .await
            .unwrap();

        // Our own record attempt must yield the racer's handle.
        let recorded = store
            .record_triggered_build(&repo(), &lock(), "our-build".to_string())
            .await
            .unwrap();
        assert_eq!(recorded, "racer-build");

        // And a subsequent trigger converges on it without a new build.
        let handle = trigger.trigger_once(&repo(), &lock(), &params()).await.unwrap();
        assert_eq!(handle, "racer-build");
        assert_eq!(builds.calls.load(Ordering::SeqCst), 0);
    }
}
