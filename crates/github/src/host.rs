//! The source-host collaborator contract.

use async_trait::async_trait;
use owlbot_core::{RepoId, Result, Snapshot};

/// One repository descriptor from an organization listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgRepo {
    /// The repository
    pub repo: RepoId,
    /// Its configured default branch
    pub default_branch: String,
}

/// One page of an organization's repositories.
///
/// Organizations can be large; callers pull one page at a time instead of
/// materializing the whole listing.
#[derive(Debug, Clone, Default)]
pub struct RepoPage {
    /// Repositories on this page
    pub repos: Vec<OrgRepo>,
    /// Page number to request next, if more pages exist
    pub next_page: Option<u32>,
}

/// Everything the sync core needs from the source-hosting API.
///
/// `head_commit` fails with [`owlbot_core::Error::NotFound`] when the branch
/// or repository is absent; batch callers must skip such repositories rather
/// than abort. Every method is an await point the caller may cancel or wrap
/// in a timeout.
#[async_trait]
pub trait RepoHost: Send + Sync {
    /// The head commit id of `branch` in `repo`.
    async fn head_commit(&self, repo: &RepoId, branch: &str) -> Result<String>;

    /// A full tree snapshot of `repo` at `reference`.
    ///
    /// One fetch per refresh; no incremental diff is available from this
    /// collaborator.
    async fn snapshot(&self, repo: &RepoId, reference: &str) -> Result<Snapshot>;

    /// One page of the organization's repositories. Pages start at 1.
    async fn list_org_repos(&self, org: &str, page: u32) -> Result<RepoPage>;

    /// Open an issue on `repo`; returns the issue number.
    async fn create_issue(&self, repo: &RepoId, title: &str, body: &str) -> Result<u64>;

    /// Add labels to an existing issue on `repo`.
    async fn add_labels(&self, repo: &RepoId, issue_number: u64, labels: &[String]) -> Result<()>;
}
