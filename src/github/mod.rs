// src/github/mod.rs
// =============================================================================
// This module is the result fetcher: everything that talks to GitHub.
//
// Currently implements:
// - Searching repositories one page at a time (10 per page, by stars)
// - Looking up a single repository for the detail view
// - Mapping upstream failures to typed errors (rate limit, not found, ...)
// - Parsing "owner/repo" or GitHub URLs typed on the command line
// =============================================================================

mod error;
mod fetch;
mod models;

// Re-export the public surface so callers can write `github::GitHubClient`
pub use error::FetchError;
pub use fetch::{parse_repo_ref, GitHubClient};
pub use models::{RepoDetails, RepoItem, SearchPage};

#[cfg(test)]
pub(crate) use models::fixtures;
