//! Error types shared across the owlbot crates.

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for owlbot operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while syncing configuration or triggering builds.
///
/// Concurrency conflicts are deliberately not represented here: losing a
/// compare-and-set race is an expected outcome and is reported through the
/// boolean return of [`crate::store::ConfigStore::compare_and_set`].
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A repository, branch or ref does not exist on the source host.
    ///
    /// Batch operations must treat this as "skip this repository", never as
    /// a reason to abort sibling work.
    #[error("Not found: {what}")]
    #[diagnostic(
        code(owlbot::not_found),
        help("The repository or branch may have been deleted or renamed")
    )]
    NotFound {
        /// Description of the missing entity (e.g., "branch main of org/repo")
        what: String,
    },

    /// Unexpected failure from the source-hosting API.
    #[error("Source host error: {message}")]
    #[diagnostic(code(owlbot::host))]
    Host {
        /// The error message
        message: String,
    },

    /// Failure from the configuration store backend.
    #[error("Config store error: {message}")]
    #[diagnostic(
        code(owlbot::store),
        help("Check that the store backend is reachable and writable")
    )]
    Store {
        /// The error message
        message: String,
    },

    /// Failure from the build system API.
    #[error("Build system error: {message}")]
    #[diagnostic(code(owlbot::build))]
    Build {
        /// The error message
        message: String,
    },

    /// Failed to serialize or deserialize a record.
    #[error("Serialization error: {message}")]
    #[diagnostic(code(owlbot::serialization))]
    Serialization {
        /// The error message
        message: String,
    },

    /// Invalid caller-supplied configuration (tokens, identifiers, paths).
    #[error("Configuration error: {message}")]
    #[diagnostic(code(owlbot::configuration))]
    Configuration {
        /// The error message
        message: String,
    },
}

impl Error {
    /// Create a not-found error.
    #[must_use]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Create a source-host error.
    #[must_use]
    pub fn host(message: impl Into<String>) -> Self {
        Self::Host {
            message: message.into(),
        }
    }

    /// Create a store error.
    #[must_use]
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create a build-system error.
    #[must_use]
    pub fn build(message: impl Into<String>) -> Self {
        Self::Build {
            message: message.into(),
        }
    }

    /// Create a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether this error means "the entity does not exist".
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
