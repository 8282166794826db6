//! The sync engine: staleness detection, optimistic store writes, and
//! per-repository error isolation.

use crate::extract::ConfigExtractor;
use crate::report;
use futures::StreamExt;
use owlbot_core::{ConfigStore, Configs, RepoId, Result};
use owlbot_github::{OrgRepo, RepoHost};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default number of repositories refreshed concurrently within one
/// organization scan.
///
/// Different repositories share no mutable state beyond the store's atomic
/// primitives, so this is purely a collaborator-politeness bound.
const DEFAULT_SCAN_CONCURRENCY: usize = 8;

/// What one refresh did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Stored record already reflects the branch head; store untouched.
    UpToDate,
    /// A new record was written for the head commit.
    Stored,
    /// A concurrent writer advanced the record first; this refresh's result
    /// was discarded. The racer's write is authoritative.
    Conflict,
}

/// Orchestrates fetch → compare → extract → store → report for one
/// repository at a time, and fans out across an organization.
pub struct SyncEngine {
    host: Arc<dyn RepoHost>,
    store: Arc<dyn ConfigStore>,
    extractor: ConfigExtractor,
    scan_concurrency: usize,
}

impl SyncEngine {
    /// Create an engine with default extraction settings.
    #[must_use]
    pub fn new(host: Arc<dyn RepoHost>, store: Arc<dyn ConfigStore>) -> Self {
        Self {
            host,
            store,
            extractor: ConfigExtractor::new(),
            scan_concurrency: DEFAULT_SCAN_CONCURRENCY,
        }
    }

    /// Replace the extractor (custom ignore prefixes).
    #[must_use]
    pub fn with_extractor(mut self, extractor: ConfigExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Set how many repositories one scan refreshes concurrently.
    ///
    /// A bound of 1 serializes the scan entirely.
    #[must_use]
    pub fn with_scan_concurrency(mut self, concurrency: usize) -> Self {
        self.scan_concurrency = concurrency.max(1);
        self
    }

    /// Bring the stored record for `repo` up to date with `branch`.
    ///
    /// Strictly sequential: the snapshot is always the one fetched for the
    /// head commit compared against. The store write is a compare-and-set
    /// keyed on `prior`'s commit hash; on a mid-air collision the computed
    /// update is dropped, never merged — last committed wins.
    pub async fn refresh_configs(
        &self,
        repo: &RepoId,
        prior: Option<&Configs>,
        branch: &str,
        installation_id: u64,
    ) -> Result<RefreshOutcome> {
        let commit = self.host.head_commit(repo, branch).await?;
        if let Some(prior) = prior
            && prior.commit_hash == commit
        {
            debug!(repo = %repo, commit, "Configs already up to date");
            return Ok(RefreshOutcome::UpToDate);
        }

        let tree = self.host.snapshot(repo, &commit).await?;
        let extraction = self.extractor.run(&tree);

        // Reported before and regardless of the store write: a lost race
        // below must not swallow the user-visible config errors.
        self.report_failures(repo, &extraction.failures).await;

        let new_configs = Configs {
            branch_name: branch.to_string(),
            commit_hash: commit.clone(),
            installation_id,
            yamls: if extraction.yamls.is_empty() {
                None
            } else {
                Some(extraction.yamls)
            },
            lock: extraction.lock,
        };
        let expected_prior = prior.map(|p| p.commit_hash.as_str());
        let stored = self
            .store
            .compare_and_set(repo, new_configs, expected_prior)
            .await?;
        if stored {
            info!(repo = %repo, commit, "Stored refreshed configs");
            Ok(RefreshOutcome::Stored)
        } else {
            debug!(repo = %repo, commit, "Lost compare-and-set race, dropping refresh");
            Ok(RefreshOutcome::Conflict)
        }
    }

    /// Refresh every repository in an organization.
    ///
    /// Pages through the listing lazily and isolates failures per
    /// repository: a missing branch (deleted mid-scan) or any other
    /// per-repository error is logged and skipped, never fatal to the scan.
    /// Repositories already committed stay committed if the scan is
    /// cancelled mid-flight.
    pub async fn scan_org(&self, org: &str, installation_id: u64) -> Result<()> {
        info!(org, "Scanning organization");
        let mut page = Some(1);
        while let Some(current) = page {
            let listing = self.host.list_org_repos(org, current).await?;
            page = listing.next_page;
            futures::stream::iter(listing.repos)
                .for_each_concurrent(self.scan_concurrency, |org_repo| async move {
                    self.scan_one(&org_repo, installation_id).await;
                })
                .await;
        }
        Ok(())
    }

    async fn scan_one(&self, org_repo: &OrgRepo, installation_id: u64) {
        let repo = &org_repo.repo;
        let refreshed = async {
            let prior = self.store.get_configs(repo).await?;
            self.refresh_configs(
                repo,
                prior.as_ref(),
                &org_repo.default_branch,
                installation_id,
            )
            .await
        }
        .await;
        match refreshed {
            Ok(outcome) => debug!(repo = %repo, ?outcome, "Repository scanned"),
            Err(e) if e.is_not_found() => {
                debug!(repo = %repo, error = %e, "Repository or branch gone, skipping");
            }
            Err(e) => warn!(repo = %repo, error = %e, "Failed to refresh repository, skipping"),
        }
    }

    /// Open one issue per failing file. Reporting is best-effort: a failed
    /// issue creation must not abort the refresh and lose a good record.
    async fn report_failures(&self, repo: &RepoId, failures: &[owlbot_core::ValidationFailure]) {
        for failure in failures {
            let title = report::issue_title(failure);
            let body = report::issue_body(failure);
            match self.host.create_issue(repo, &title, &body).await {
                Ok(number) => {
                    if let Err(e) = self
                        .host
                        .add_labels(repo, number, &[report::ERROR_LABEL.to_string()])
                        .await
                    {
                        warn!(repo = %repo, number, error = %e, "Failed to label issue");
                    }
                }
                Err(e) => {
                    warn!(
                        repo = %repo,
                        path = %failure.path,
                        error = %e,
                        "Failed to open config-error issue"
                    );
                }
            }
        }
    }
}
