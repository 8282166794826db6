//! The build-system collaborator contract.
//!
//! The concrete Cloud Build client lives outside this crate; everything it
//! needs is carried in the substitution map passed to [`CloudBuildClient`].

use async_trait::async_trait;
use owlbot_core::Result;
use serde::{Deserialize, Serialize};

/// Substitution variables handed to the build system.
///
/// Every field is derived deterministically from the lock and repository, so
/// repeated trigger attempts for the same lock state produce an identical
/// build request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitutions {
    /// Pinned generator container, `image@digest`
    #[serde(rename = "_CONTAINER")]
    pub container: String,
    /// Token the build uses to push branches and open pull requests
    #[serde(rename = "_GITHUB_TOKEN")]
    pub github_token: String,
    /// Repository path of the lock file being regenerated
    #[serde(rename = "_LOCK_FILE_PATH")]
    pub lock_file_path: String,
    /// Image of the generator CLI the build runs
    #[serde(rename = "_OWL_BOT_CLI")]
    pub owl_bot_cli: String,
    /// Deterministic pull-request branch, same for every retry of one digest
    #[serde(rename = "_PR_BRANCH")]
    pub pr_branch: String,
    /// Repository owner
    #[serde(rename = "_PR_OWNER")]
    pub pr_owner: String,
    /// Repository name
    #[serde(rename = "_REPOSITORY")]
    pub repository: String,
}

/// Minimal Cloud Build surface consumed by the trigger protocol.
#[async_trait]
pub trait CloudBuildClient: Send + Sync {
    /// Start one build from a configured trigger; returns the build id.
    async fn create_build(
        &self,
        project_id: &str,
        trigger_id: &str,
        substitutions: &Substitutions,
    ) -> Result<String>;
}
