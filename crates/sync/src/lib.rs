//! Config synchronization core for owlbot.
//!
//! Keeps the stored per-repository [`owlbot_core::Configs`] records in sync
//! with repository contents:
//! - [`extract::ConfigExtractor`] scans tree snapshots for recognized
//!   config and lock files;
//! - [`engine::SyncEngine`] orchestrates staleness detection, optimistic
//!   store writes and per-file error reporting, for one repository
//!   (`refresh_configs`) or a whole organization (`scan_org`).

pub mod engine;
pub mod extract;
pub mod report;

pub use engine::{RefreshOutcome, SyncEngine};
pub use extract::{ConfigExtractor, Extraction, ExtractorConfig};
