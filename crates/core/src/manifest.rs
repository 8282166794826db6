//! Schema types for the recognized configuration files.
//!
//! Two file kinds exist by filename convention:
//! - the config file (`.OwlBot.yaml`), zero or more per repository, one per
//!   directory at any depth, customizing generation for that subtree;
//! - the lock file (`.github/.OwlBot.lock.yaml`), exactly one per repository,
//!   pinning the generator image and digest.
//!
//! Parsing and schema validation are pure: the validator returns the full
//! list of violations, keeping the original parser/validator message text so
//! it can be embedded verbatim in issue reports.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// File name of per-directory config files, matched at any depth.
pub const CONFIG_FILE_NAME: &str = ".OwlBot.yaml";

/// Canonical root path of the lock file.
pub const LOCK_FILE_PATH: &str = ".github/.OwlBot.lock.yaml";

/// Container image reference, optionally pinned to a digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DockerSpec {
    /// Image reference (e.g., `gcr.io/project/image:latest`)
    pub image: String,
    /// Content digest (e.g., `sha256:abcdef…`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// One source→dest copy rule from a config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeepCopyRegex {
    /// Pattern matched against generated file paths
    pub source: String,
    /// Destination path template; must start with `/`
    pub dest: String,
}

/// Parsed and validated contents of a `.OwlBot.yaml` config file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OwlBotYaml {
    /// Post-processor container to run after generation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker: Option<DockerSpec>,
    /// Squash generated commits into one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub squash: Option<bool>,
    /// Copy rules applied to generated output
    #[serde(
        rename = "deep-copy-regex",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub deep_copy_regex: Vec<DeepCopyRegex>,
    /// Paths removed from the destination before copying
    #[serde(
        rename = "deep-remove-regex",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub deep_remove_regex: Vec<String>,
    /// Paths preserved from removal
    #[serde(
        rename = "deep-preserve-regex",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub deep_preserve_regex: Vec<String>,
    /// Ignore generation commits at or before this hash
    #[serde(
        rename = "begin-after-commit-hash",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub begin_after_commit_hash: Option<String>,
    /// API name used for commit message attribution
    #[serde(rename = "api-name", default, skip_serializing_if = "Option::is_none")]
    pub api_name: Option<String>,
}

impl OwlBotYaml {
    /// Parse and schema-validate a config file.
    ///
    /// Returns every violation found, not just the first; error strings keep
    /// the underlying `serde_yaml`/`regex` message text.
    pub fn from_yaml(text: &str) -> std::result::Result<Self, Vec<String>> {
        let yaml: Self = match serde_yaml::from_str(text) {
            Ok(yaml) => yaml,
            Err(e) => return Err(vec![e.to_string()]),
        };
        let errors = yaml.validate();
        if errors.is_empty() { Ok(yaml) } else { Err(errors) }
    }

    /// Validate semantic rules beyond what serde enforces.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for rule in &self.deep_copy_regex {
            check_pattern(&rule.source, "deep-copy-regex.source", &mut errors);
            if !rule.dest.starts_with('/') {
                errors.push(format!(
                    "deep-copy-regex.dest must begin with '/': {}",
                    rule.dest
                ));
            }
        }
        for pattern in &self.deep_remove_regex {
            check_pattern(pattern, "deep-remove-regex", &mut errors);
            check_leading_slash(pattern, "deep-remove-regex", &mut errors);
        }
        for pattern in &self.deep_preserve_regex {
            check_pattern(pattern, "deep-preserve-regex", &mut errors);
            check_leading_slash(pattern, "deep-preserve-regex", &mut errors);
        }
        errors
    }
}

fn check_pattern(pattern: &str, field: &str, errors: &mut Vec<String>) {
    if let Err(e) = Regex::new(pattern) {
        errors.push(format!("{field} is not a valid regular expression: {e}"));
    }
}

fn check_leading_slash(pattern: &str, field: &str, errors: &mut Vec<String>) {
    if !pattern.starts_with('/') {
        errors.push(format!("{field} must begin with '/': {pattern}"));
    }
}

/// Image reference pinned by a lock file, digest required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LockDocker {
    /// Image reference without digest
    pub image: String,
    /// Content digest (e.g., `sha256:abcdef…`)
    pub digest: String,
}

/// Parsed contents of the `.github/.OwlBot.lock.yaml` lock file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OwlBotLock {
    /// The pinned generator container
    pub docker: LockDocker,
}

impl OwlBotLock {
    /// Parse a lock file, keeping the parser message text on failure.
    pub fn from_yaml(text: &str) -> std::result::Result<Self, Vec<String>> {
        serde_yaml::from_str(text).map_err(|e| vec![e.to_string()])
    }

    /// The lock-content identity: `image@digest`.
    ///
    /// This is the deduplication key for triggered builds; two locks with
    /// the same container reference are the same lock state.
    #[must_use]
    pub fn container(&self) -> String {
        format!("{}@{}", self.docker.image, self.docker.digest)
    }
}
