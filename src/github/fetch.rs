// src/github/fetch.rs
// =============================================================================
// This module talks to the GitHub REST API.
//
// Two calls:
// - fetch_page:   GET /search/repositories?q=..&sort=stars&order=desc&per_page=10&page=N
// - fetch_detail: GET /repos/{owner}/{repo}
//
// Each call makes exactly one HTTP request. There is no cache and no retry;
// failures come back as a typed FetchError (see error.rs).
//
// Every request carries:
// - Accept: application/vnd.github.v3+json  (pins the API version)
// - User-Agent                              (GitHub rejects requests without one)
// - Authorization: Bearer <token>           (only when a token is configured)
// =============================================================================

use anyhow::{anyhow, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response};
use tracing::{debug, info, warn};
use url::Url;

use super::error::{classify_failure, Endpoint, FetchError};
use super::models::{RepoItem, SearchPage, SearchResponse};
use crate::config::ApiConfig;

/// GitHub only serves the first 1000 hits of any search
pub const SEARCH_RESULT_CAP: usize = 1000;

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github.v3+json";
const CLIENT_USER_AGENT: &str = concat!("repo-scout/", env!("CARGO_PKG_VERSION"));

/// HTTP client bound to one API base URL
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    base_url: Url,
    per_page: u32,
}

impl GitHubClient {
    /// Creates a client with the default headers (and token) baked in.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .context("Invalid token value")?;
            // Keeps the token out of Debug output
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            per_page: config.per_page,
        })
    }

    /// Fetches one page of repositories matching `term`, most-starred first.
    ///
    /// `total_available` is the provider's total, clamped to what the search
    /// API will actually hand out.
    pub async fn fetch_page(&self, term: &str, page: u32) -> Result<SearchPage, FetchError> {
        let url = self.search_url(term, page)?;

        info!(term = term.trim(), page, "searching repositories");
        let response = self.http.get(url).send().await?;
        let response = check_status(response, Endpoint::Search).await?;
        let body: SearchResponse = response.json().await?;

        if body.incomplete_results {
            debug!("upstream search timed out; results may be incomplete");
        }

        let total_available = usize::try_from(body.total_count)
            .unwrap_or(usize::MAX)
            .min(SEARCH_RESULT_CAP);

        debug!(
            page,
            received = body.items.len(),
            total_count = body.total_count,
            "search page received"
        );

        Ok(SearchPage {
            total_count: body.total_count,
            items: body.items,
            total_available,
        })
    }

    /// Fetches a single repository. A 404 comes back as `FetchError::NotFound`.
    pub async fn fetch_detail(&self, owner: &str, repo: &str) -> Result<RepoItem, FetchError> {
        let (owner, repo) = (owner.trim(), repo.trim());
        if owner.is_empty() || repo.is_empty() {
            return Err(FetchError::Validation(
                "owner and repository name are required".to_string(),
            ));
        }

        let url = self.endpoint(&["repos", owner, repo])?;

        info!(owner, repo, "fetching repository details");
        let response = self.http.get(url).send().await?;
        let response = check_status(response, Endpoint::Detail).await?;

        Ok(response.json::<RepoItem>().await?)
    }

    // Builds the search URL, validating the inputs first
    fn search_url(&self, term: &str, page: u32) -> Result<Url, FetchError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(FetchError::Validation("search term must not be empty".to_string()));
        }
        if page == 0 {
            return Err(FetchError::Validation("page numbers start at 1".to_string()));
        }

        let mut url = self.endpoint(&["search", "repositories"])?;
        url.query_pairs_mut()
            .append_pair("q", term)
            .append_pair("sort", "stars")
            .append_pair("order", "desc")
            .append_pair("per_page", &self.per_page.to_string())
            .append_pair("page", &page.to_string());

        Ok(url)
    }

    // Appends path segments to the base URL
    //
    // Segments are percent-encoded, so an owner or repo name can never
    // escape into another path.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                FetchError::Validation(format!("API URL cannot be used as a base: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

// Passes 2xx responses through and classifies everything else
async fn check_status(response: Response, endpoint: Endpoint) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await?;
    let error = classify_failure(status, &body, endpoint);
    warn!(status = status.as_u16(), ?endpoint, "GitHub API error: {}", error);
    Err(error)
}

// Parses a repository reference into (owner, repo)
//
// Supported formats:
//   - owner/repo
//   - https://github.com/owner/repo
//   - https://github.com/owner/repo.git
//   - github.com/owner/repo/tree/main   (anything after the repo is ignored)
//
// Example:
//   "https://github.com/rust-lang/rust" -> ("rust-lang", "rust")
pub fn parse_repo_ref(input: &str) -> Result<(String, String)> {
    let trimmed = input.trim();
    let had_scheme = trimmed.contains("://");

    // Remove common prefixes
    let path = trimmed
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("www.");

    let path = match path.strip_prefix("github.com/") {
        Some(rest) => rest,
        None if had_scheme => {
            return Err(anyhow!("Not a GitHub repository reference: {}", trimmed));
        }
        None => path,
    };

    let mut parts = path.split('/').filter(|p| !p.is_empty());
    let (Some(owner), Some(repo)) = (parts.next(), parts.next()) else {
        return Err(anyhow!("Expected owner/repo, got: {}", trimmed));
    };

    // GitHub logins never contain dots, so this is some other host
    if owner.contains('.') {
        return Err(anyhow!("Not a GitHub repository reference: {}", trimmed));
    }

    let repo = repo.trim_end_matches(".git");
    if repo.is_empty() {
        return Err(anyhow!("Expected owner/repo, got: {}", trimmed));
    }

    Ok((owner.to_string(), repo.to_string()))
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why two error types (anyhow::Result and FetchError)?
//    - FetchError is an enum, so callers can match on what went wrong
//    - anyhow is used where we only need a message (client setup, parsing
//      what the user typed)
//
// 2. How does `?` turn a reqwest::Error into a FetchError?
//    - FetchError::Network is marked #[from] in error.rs
//    - thiserror generates `impl From<reqwest::Error> for FetchError`
//    - `?` calls that From impl automatically
//
// 3. Why build URLs with Url instead of format!?
//    - query_pairs_mut() percent-encodes the search term
//    - path_segments_mut() encodes owner and repo, so "a/b" stays one segment
//
// 4. What is #[derive(Clone)] on a struct holding a reqwest::Client?
//    - reqwest::Client is a handle around a shared connection pool
//    - Cloning it is cheap and every clone reuses the same connections
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn client_for(base: &str, token: Option<&str>) -> GitHubClient {
        let config = ApiConfig::new(base, token.map(str::to_string), 5).unwrap();
        GitHubClient::new(&config).unwrap()
    }

    // Serves exactly one canned HTTP response and hands back the raw request
    async fn serve_once(status_line: &str, body: &str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            // GET requests have no body, so the headers end the request
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });

        (base, handle)
    }

    #[test]
    fn test_search_url() {
        let client = client_for("https://api.github.com", None);
        let url = client.search_url("  tokio runtime ", 3).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/search/repositories?q=tokio+runtime&sort=stars&order=desc&per_page=10&page=3"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path_and_encodes_segments() {
        let client = client_for("https://ghe.example.com/api/v3/", None);
        let url = client.endpoint(&["repos", "some owner", "a/b"]).unwrap();
        assert_eq!(url.as_str(), "https://ghe.example.com/api/v3/repos/some%20owner/a%2Fb");
    }

    #[tokio::test]
    async fn test_invalid_input_never_hits_network() {
        // Nothing listens on the discard port; a request would fail as Network
        let client = client_for("http://127.0.0.1:9", None);

        let err = client.fetch_page("   ", 1).await.unwrap_err();
        assert!(matches!(err, FetchError::Validation(_)));

        let err = client.fetch_page("rust", 0).await.unwrap_err();
        assert!(matches!(err, FetchError::Validation(_)));

        let err = client.fetch_detail("", "repo").await.unwrap_err();
        assert!(matches!(err, FetchError::Validation(_)));
    }

    #[tokio::test]
    async fn test_fetch_page_success_sends_headers() {
        let body = r#"{"total_count":25,"incomplete_results":false,"items":[
            {"id":1,"name":"test-repo","full_name":"test/test-repo","language":"Rust",
             "owner":{"login":"test","avatar_url":"https://a/u/1"},
             "stargazers_count":10,"watchers_count":10,"forks_count":1,"open_issues_count":0,
             "description":null,"html_url":"https://github.com/test/test-repo"}]}"#;
        let (base, server) = serve_once("200 OK", body).await;
        let client = client_for(&base, Some("secret"));

        let page = client.fetch_page("test", 1).await.unwrap();
        assert_eq!(page.total_available, 25);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].name, "test-repo");

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with(
            "get /search/repositories?q=test&sort=stars&order=desc&per_page=10&page=1 "
        ));
        assert!(request.contains("authorization: bearer secret"));
        assert!(request.contains("accept: application/vnd.github.v3+json"));
        assert!(request.contains("user-agent: repo-scout/"));
    }

    #[tokio::test]
    async fn test_total_is_clamped_to_search_cap() {
        let body = r#"{"total_count":2500000,"items":[]}"#;
        let (base, _server) = serve_once("200 OK", body).await;
        let client = client_for(&base, None);

        let page = client.fetch_page("a", 1).await.unwrap();
        assert_eq!(page.total_available, SEARCH_RESULT_CAP);
        // The reported total is kept for display
        assert_eq!(page.total_count, 2_500_000);
    }

    #[tokio::test]
    async fn test_search_rate_limited() {
        let body = r#"{"message":"API rate limit exceeded for 127.0.0.1."}"#;
        let (base, _server) = serve_once("403 Forbidden", body).await;
        let client = client_for(&base, None);

        let err = client.fetch_page("test", 1).await.unwrap_err();
        assert!(matches!(err, FetchError::RateLimited { .. }));
    }

    #[tokio::test]
    async fn test_search_upstream_error_keeps_status_and_details() {
        let body = r#"{"message":"Internal Server Error"}"#;
        let (base, _server) = serve_once("500 Internal Server Error", body).await;
        let client = client_for(&base, None);

        match client.fetch_page("test", 1).await.unwrap_err() {
            FetchError::Upstream { status, details } => {
                assert_eq!(status, 500);
                assert_eq!(details["message"], "Internal Server Error");
            }
            other => panic!("expected Upstream, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_detail_not_found() {
        let (base, server) = serve_once("404 Not Found", r#"{"message":"Not Found"}"#).await;
        let client = client_for(&base, None);

        let err = client.fetch_detail("unknown", "unknown").await.unwrap_err();
        assert!(matches!(err, FetchError::NotFound));

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /repos/unknown/unknown "));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_failure() {
        // Bind then drop so the port is (almost certainly) closed
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let client = client_for(&base, None);
        let err = client.fetch_page("test", 1).await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }

    #[test]
    fn test_parse_repo_ref_short_form() {
        let (owner, repo) = parse_repo_ref("rust-lang/rust").unwrap();
        assert_eq!(owner, "rust-lang");
        assert_eq!(repo, "rust");
    }

    #[test]
    fn test_parse_repo_ref_url_with_git() {
        let (owner, repo) = parse_repo_ref("https://github.com/user/repo.git").unwrap();
        assert_eq!(owner, "user");
        assert_eq!(repo, "repo");
    }

    #[test]
    fn test_parse_repo_ref_ignores_trailing_path() {
        let (owner, repo) = parse_repo_ref("github.com/tokio-rs/tokio/tree/master").unwrap();
        assert_eq!(owner, "tokio-rs");
        assert_eq!(repo, "tokio");
    }

    #[test]
    fn test_parse_invalid_refs() {
        assert!(parse_repo_ref("https://gitlab.com/user/repo").is_err());
        assert!(parse_repo_ref("gitlab.com/user/repo").is_err());
        assert!(parse_repo_ref("just-a-name").is_err());
        assert!(parse_repo_ref("owner/.git").is_err());
        assert!(parse_repo_ref("").is_err());
    }
}
