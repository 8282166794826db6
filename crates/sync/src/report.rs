//! Issue rendering for configuration failures.
//!
//! Configuration problems surface to users exclusively through created
//! issues, one per offending file, carrying the underlying validator text.

use owlbot_core::ValidationFailure;

/// Label applied to configuration-error issues.
pub const ERROR_LABEL: &str = "owl-bot-error";

/// Issue title for one failing file.
#[must_use]
pub fn issue_title(failure: &ValidationFailure) -> String {
    format!("Invalid OwlBot configuration: {}", failure.path)
}

/// Issue body for one failing file: the path plus the verbatim
/// parser/validator error text.
#[must_use]
pub fn issue_body(failure: &ValidationFailure) -> String {
    format!(
        "The configuration file `{path}` could not be used:\n\n\
         ```\n{message}\n```\n\n\
         Fix the file on the tracked branch to resume configuration sync \
         for this repository. The previously stored configuration remains \
         in effect until then.",
        path = failure.path,
        message = failure.message,
    )
}
