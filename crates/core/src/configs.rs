//! Persisted per-repository configuration records.

use crate::manifest::{OwlBotLock, OwlBotYaml};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A repository identity, `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoId {
    /// Owning user or organization
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl RepoId {
    /// Create a repository identity from its owner/name split.
    #[must_use]
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse an `owner/name` string.
    pub fn parse(full_name: &str) -> Result<Self> {
        match full_name.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() => {
                Ok(Self::new(owner, name))
            }
            _ => Err(Error::configuration(format!(
                "repository must be written as owner/name: {full_name}"
            ))),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl TryFrom<String> for RepoId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<RepoId> for String {
    fn from(repo: RepoId) -> Self {
        repo.to_string()
    }
}

/// One discovered config file: its path and parsed value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Path within the repository tree
    pub path: String,
    /// Parsed and validated file contents
    pub yaml: OwlBotYaml,
}

/// The persisted record for one repository.
///
/// A stored `Configs` is always internally consistent with exactly one
/// `commit_hash`; the store never mixes fields from two commits. The
/// `commit_hash` doubles as the optimistic-concurrency version token for
/// [`crate::store::ConfigStore::compare_and_set`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configs {
    /// The tracked branch
    pub branch_name: String,
    /// Commit this record reflects
    pub commit_hash: String,
    /// Authorization context the record was fetched under
    pub installation_id: u64,
    /// Discovered config files, in discovery order; omitted when none found
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yamls: Option<Vec<ConfigFile>>,
    /// Parsed lock file; omitted when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock: Option<OwlBotLock>,
}

/// A repository whose stored configs reference some file or image.
///
/// Read-only projection produced by store queries; never mutated here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffectedRepo {
    /// The repository
    pub repo: RepoId,
    /// Its current stored record
    pub configs: Configs,
}

/// One config file that failed to parse or validate.
///
/// Ephemeral: produced per extraction pass, consumed to generate issue
/// reports, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    /// Path of the offending file
    pub path: String,
    /// Human-readable message embedding the parser/validator error text
    pub message: String,
}
