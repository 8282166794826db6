//! Config extraction from tree snapshots.
//!
//! Scans a snapshot for the two recognized file kinds (per-directory config
//! files and the root lock file), parses and schema-validates each, and
//! collects per-file failures without letting one bad file block the rest.

use owlbot_core::manifest::{CONFIG_FILE_NAME, LOCK_FILE_PATH};
use owlbot_core::{ConfigFile, OwlBotLock, OwlBotYaml, Snapshot, ValidationFailure};
use tracing::debug;

/// Extraction settings.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Path prefixes skipped entirely: no validation, no failure reporting,
    /// not included in output. Template and staging directories hold copies
    /// of config files that are not this repository's own configuration.
    pub ignore_prefixes: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            ignore_prefixes: vec!["owl-bot-staging/".to_string(), "templates/".to_string()],
        }
    }
}

/// Result of one extraction pass over a snapshot.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Valid config files, in snapshot enumeration order
    pub yamls: Vec<ConfigFile>,
    /// The parsed root lock file, if present and valid
    pub lock: Option<OwlBotLock>,
    /// One entry per file that failed to parse or validate
    pub failures: Vec<ValidationFailure>,
}

/// Scans snapshots for recognized configuration files.
#[derive(Debug, Clone, Default)]
pub struct ConfigExtractor {
    config: ExtractorConfig,
}

impl ConfigExtractor {
    /// Create an extractor with default ignore prefixes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an extractor with custom settings.
    #[must_use]
    pub fn with_config(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Run one extraction pass.
    #[must_use]
    pub fn run(&self, snapshot: &Snapshot) -> Extraction {
        let mut extraction = Extraction::default();
        for (path, content) in snapshot.iter() {
            if self.is_ignored(path) {
                continue;
            }
            if path == LOCK_FILE_PATH {
                match parse_text(path, content).and_then(|text| OwlBotLock::from_yaml(&text)) {
                    Ok(lock) => extraction.lock = Some(lock),
                    Err(errors) => extraction.failures.push(failure(path, &errors)),
                }
            } else if file_name(path) == CONFIG_FILE_NAME {
                match parse_text(path, content).and_then(|text| OwlBotYaml::from_yaml(&text)) {
                    Ok(yaml) => extraction.yamls.push(ConfigFile {
                        path: path.to_string(),
                        yaml,
                    }),
                    Err(errors) => extraction.failures.push(failure(path, &errors)),
                }
            }
        }
        debug!(
            yamls = extraction.yamls.len(),
            lock = extraction.lock.is_some(),
            failures = extraction.failures.len(),
            "Extraction pass complete"
        );
        extraction
    }

    fn is_ignored(&self, path: &str) -> bool {
        self.config
            .ignore_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn parse_text(path: &str, content: &[u8]) -> std::result::Result<String, Vec<String>> {
    String::from_utf8(content.to_vec())
        .map_err(|e| vec![format!("{path} is not valid UTF-8: {e}")])
}

fn failure(path: &str, errors: &[String]) -> ValidationFailure {
    ValidationFailure {
        path: path.to_string(),
        message: errors.join("\n"),
    }
}
