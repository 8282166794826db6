//! Octocrab-backed [`RepoHost`] implementation.

use crate::host::{OrgRepo, RepoHost, RepoPage};
use async_trait::async_trait;
use http_body_util::BodyExt;
use octocrab::Octocrab;
use octocrab::params::repos::Reference;
use owlbot_core::{Error, RepoId, Result, Snapshot};
use std::path::Component;
use tracing::{debug, info, warn};

/// Page size used for organization listings.
const REPOS_PER_PAGE: u8 = 100;

/// [`RepoHost`] backed by the GitHub REST API.
pub struct GitHubRepoHost {
    octocrab: Octocrab,
}

impl GitHubRepoHost {
    /// Create a host client authenticated with a personal or installation
    /// token. Token acquisition itself happens outside this crate.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(Error::configuration("GitHub token is empty"));
        }
        let octocrab = Octocrab::builder()
            .personal_token(token)
            .build()
            .map_err(|e| Error::configuration(format!("Failed to create GitHub client: {e}")))?;
        Ok(Self { octocrab })
    }

    /// Wrap an existing client (e.g., one carrying app-installation auth).
    #[must_use]
    pub fn from_client(octocrab: Octocrab) -> Self {
        Self { octocrab }
    }
}

/// Map an octocrab failure, turning a 404 into [`Error::NotFound`] so batch
/// callers can tell "skip this repository" apart from real failures.
fn map_api_error(e: octocrab::Error, what: impl Into<String>) -> Error {
    if let octocrab::Error::GitHub { ref source, .. } = e
        && source.status_code.as_u16() == 404
    {
        return Error::not_found(what);
    }
    Error::host(e.to_string())
}

#[async_trait]
impl RepoHost for GitHubRepoHost {
    async fn head_commit(&self, repo: &RepoId, branch: &str) -> Result<String> {
        debug!(repo = %repo, branch, "Resolving head commit");
        let reference = self
            .octocrab
            .repos(&repo.owner, &repo.name)
            .get_ref(&Reference::Branch(branch.to_string()))
            .await
            .map_err(|e| map_api_error(e, format!("branch {branch} of {repo}")))?;
        match reference.object {
            octocrab::models::repos::Object::Commit { sha, .. } => Ok(sha),
            other => Err(Error::host(format!(
                "ref {branch} of {repo} does not point at a commit: {other:?}"
            ))),
        }
    }

    async fn snapshot(&self, repo: &RepoId, reference: &str) -> Result<Snapshot> {
        debug!(repo = %repo, reference, "Downloading tree snapshot");
        let response = self
            .octocrab
            .repos(&repo.owner, &repo.name)
            .download_tarball(reference.to_string())
            .await
            .map_err(|e| map_api_error(e, format!("archive of {repo} at {reference}")))?;
        let bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|e| Error::host(format!("Failed to read archive of {repo}: {e}")))?
            .to_bytes();
        let snapshot = unpack_tarball(&bytes)?;
        info!(repo = %repo, files = snapshot.len(), "Snapshot downloaded");
        Ok(snapshot)
    }

    async fn list_org_repos(&self, org: &str, page: u32) -> Result<RepoPage> {
        debug!(org, page, "Listing organization repositories");
        let listing = self
            .octocrab
            .orgs(org)
            .list_repos()
            .per_page(REPOS_PER_PAGE)
            .page(page)
            .send()
            .await
            .map_err(|e| map_api_error(e, format!("organization {org}")))?;
        let next_page = listing.next.as_ref().map(|_| page + 1);
        let repos = listing
            .items
            .into_iter()
            .filter_map(|r| {
                let Some(default_branch) = r.default_branch else {
                    warn!(org, repo = %r.name, "Repository has no default branch, skipping");
                    return None;
                };
                Some(OrgRepo {
                    repo: RepoId::new(org, r.name),
                    default_branch,
                })
            })
            .collect();
        Ok(RepoPage { repos, next_page })
    }

    async fn create_issue(&self, repo: &RepoId, title: &str, body: &str) -> Result<u64> {
        let issue = self
            .octocrab
            .issues(&repo.owner, &repo.name)
            .create(title)
            .body(body)
            .send()
            .await
            .map_err(|e| map_api_error(e, format!("repository {repo}")))?;
        info!(repo = %repo, number = issue.number, "Opened issue");
        Ok(issue.number)
    }

    async fn add_labels(&self, repo: &RepoId, issue_number: u64, labels: &[String]) -> Result<()> {
        self.octocrab
            .issues(&repo.owner, &repo.name)
            .add_labels(issue_number, labels)
            .await
            .map_err(|e| map_api_error(e, format!("issue #{issue_number} of {repo}")))?;
        Ok(())
    }
}

/// Unpack a gzipped tarball into a [`Snapshot`].
///
/// GitHub archives prefix every entry with a `owner-repo-sha/` directory;
/// that leading component is stripped so paths are repository-relative.
fn unpack_tarball(bytes: &[u8]) -> Result<Snapshot> {
    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(bytes));
    let mut snapshot = Snapshot::new();
    let entries = archive
        .entries()
        .map_err(|e| Error::host(format!("Malformed archive: {e}")))?;
    for entry in entries {
        let mut entry = entry.map_err(|e| Error::host(format!("Malformed archive entry: {e}")))?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let path = entry
            .path()
            .map_err(|e| Error::host(format!("Malformed archive path: {e}")))?
            .into_owned();
        let Some(relative) = strip_archive_root(&path) else {
            continue;
        };
        let mut content = Vec::new();
        std::io::Read::read_to_end(&mut entry, &mut content)
            .map_err(|e| Error::host(format!("Failed to read {}: {e}", path.display())))?;
        snapshot.insert(relative, content);
    }
    Ok(snapshot)
}

/// Drop the archive's synthetic root directory, yielding a `/`-separated
/// repository-relative path. Entries without a component past the root
/// (the root directory itself) yield `None`.
fn strip_archive_root(path: &std::path::Path) -> Option<String> {
    let parts: Vec<&str> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .skip(1)
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn tarball(files: &[(&str, &str)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (path, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, path, content.as_bytes())
                .unwrap();
        }
        let tar_bytes = builder.into_inner().unwrap();
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&tar_bytes).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn unpack_strips_archive_root() {
        let bytes = tarball(&[
            ("googleapis-nodejs-vision-abc123/.github/.OwlBot.yaml", "docker:\n  image: x\n"),
            ("googleapis-nodejs-vision-abc123/src/index.ts", "export {};\n"),
        ]);
        let snapshot = unpack_tarball(&bytes).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.get(".github/.OwlBot.yaml").is_some());
        assert!(snapshot.get("src/index.ts").is_some());
    }

    #[test]
    fn unpack_rejects_garbage() {
        assert!(unpack_tarball(b"definitely not a tarball").is_err());
    }
}
