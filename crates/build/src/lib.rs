//! Deduplicated build triggering for owlbot.
//!
//! [`trigger::BuildTrigger`] guarantees at most one recorded build handle
//! per `(repository, lock)` pair, consulting the shared
//! [`owlbot_core::ConfigStore`] for the idempotent record. The concrete
//! build system binds behind [`backend::CloudBuildClient`].

pub mod backend;
pub mod trigger;

pub use backend::{CloudBuildClient, Substitutions};
pub use trigger::{BuildTrigger, TriggerParams};
