//! GitHub-backed repository host for owlbot.
//!
//! This crate is the boundary to the source-hosting API:
//! - [`RepoHost`] is the collaborator contract the sync core consumes
//!   (head commits, tree snapshots, paginated org listing, issue reporting);
//! - [`GitHubRepoHost`] implements it over the GitHub REST API.
//!
//! Webhook routing and token exchange live outside this crate; it only
//! consumes an already-authenticated client or token.

pub mod client;
pub mod host;

pub use client::GitHubRepoHost;
pub use host::{OrgRepo, RepoHost, RepoPage};
