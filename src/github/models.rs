// src/github/models.rs
// =============================================================================
// Data shapes for the GitHub repository API.
//
// The upstream payloads carry dozens of fields per repository. We only keep
// the handful the list and detail views need; serde silently skips the rest,
// so deserializing straight into RepoItem *is* the projection step.
//
// Serialized output mirrors the JSON the search/detail endpoints hand to a
// browser client:
//   search  -> { "total_count": 25, "repositories": [ ... ] }
//   detail  -> { "repoDetails": { ... } }
// =============================================================================

use serde::{Deserialize, Serialize};

/// Owner of a repository (user or organization).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub login: String,
    pub avatar_url: String,
}

/// One repository, as shown in the result list and the detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoItem {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    /// Primary language; GitHub reports null for repos without code
    pub language: Option<String>,
    pub owner: Owner,
    pub stargazers_count: u64,
    pub watchers_count: u64,
    pub forks_count: u64,
    pub open_issues_count: u64,
    pub description: Option<String>,
    pub html_url: String,
}

// Raw body of GET /search/repositories
//
// Only total_count and items matter to us; incomplete_results is accepted so
// that a timed-out upstream search still decodes.
#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    pub items: Vec<RepoItem>,
}

/// One page of search results plus the provider-reported total.
///
/// `total_count` is what the provider reported and is what gets printed.
/// `total_available` is the part of it that can actually be paged through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchPage {
    pub total_count: u64,
    #[serde(rename = "repositories")]
    pub items: Vec<RepoItem>,
    #[serde(skip)]
    pub total_available: usize,
}

/// Wrapper used when printing a single repository as JSON.
#[derive(Debug, Serialize)]
pub struct RepoDetails<'a> {
    #[serde(rename = "repoDetails")]
    pub repo_details: &'a RepoItem,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_response_drops_unused_fields() {
        let body = r#"{
            "total_count": 2,
            "incomplete_results": false,
            "items": [{
                "id": 1,
                "node_id": "MDEwOlJlcG9zaXRvcnkx",
                "name": "test-repo",
                "full_name": "test/test-repo",
                "private": false,
                "language": null,
                "owner": { "login": "test", "id": 9, "avatar_url": "https://a/u/9" },
                "stargazers_count": 5,
                "watchers_count": 5,
                "forks_count": 0,
                "open_issues_count": 2,
                "description": "a repo",
                "html_url": "https://github.com/test/test-repo",
                "topics": ["x"]
            }]
        }"#;

        let parsed: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.total_count, 2);
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.items[0].name, "test-repo");
        assert_eq!(parsed.items[0].owner.login, "test");
        assert_eq!(parsed.items[0].language, None);
    }

    #[test]
    fn test_search_page_uses_endpoint_field_names() {
        let page = fixtures::page(1, 1, 25);
        let value = serde_json::to_value(&page).unwrap();

        assert_eq!(value["total_count"], 25);
        assert_eq!(value["repositories"][0]["name"], "repo-1");
        assert!(value.get("items").is_none());
    }

    #[test]
    fn test_search_page_prints_reported_total_not_pageable_total() {
        let mut page = fixtures::page(0, 10, 1000);
        page.total_count = 2_500_000;
        let value = serde_json::to_value(&page).unwrap();

        assert_eq!(value["total_count"], 2_500_000);
        assert!(value.get("total_available").is_none());
    }

    #[test]
    fn test_fixture_ids_past_ten_thousand() {
        assert_eq!(fixtures::repo(10_500).stargazers_count, 0);
        assert_eq!(fixtures::repo(1001).stargazers_count, 8999);
    }

    #[test]
    fn test_repo_details_wrapper() {
        let item = fixtures::repo(7);
        let value = serde_json::to_value(RepoDetails { repo_details: &item }).unwrap();
        assert_eq!(value["repoDetails"]["full_name"], "owner/repo-7");
    }
}
