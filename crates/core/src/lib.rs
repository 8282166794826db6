//! Core types and contracts for owlbot.
//!
//! This crate holds everything the other owlbot crates share:
//! - the persisted data model ([`configs::Configs`] and friends);
//! - the recognized file schemas ([`manifest::OwlBotYaml`],
//!   [`manifest::OwlBotLock`]) and their pure validator;
//! - the tree [`snapshot::Snapshot`] exchanged between the source host and
//!   the extractor;
//! - the [`store::ConfigStore`] contract with its two concurrency
//!   primitives, plus an in-memory backend;
//! - the [`Error`] taxonomy shared by every operation.

pub mod configs;
pub mod error;
pub mod manifest;
pub mod snapshot;
pub mod store;

pub use configs::{AffectedRepo, ConfigFile, Configs, RepoId, ValidationFailure};
pub use error::{Error, Result};
pub use manifest::{OwlBotLock, OwlBotYaml};
pub use snapshot::Snapshot;
pub use store::{ConfigStore, MemoryConfigStore};
