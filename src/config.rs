// src/config.rs
// =============================================================================
// Runtime configuration for talking to the GitHub API.
//
// Sources, in order of precedence:
// 1. Command-line flags (--api-url, --token, --timeout)
// 2. Environment variables (GITHUB_API_URL, GITHUB_TOKEN, REPO_SCOUT_TIMEOUT_SECS)
// 3. A .env file in the working directory (loaded into the environment by
//    dotenvy before clap looks at it)
// 4. Built-in defaults
//
// clap does the flag/env merging; this module validates the result once so
// the rest of the program can trust it.
// =============================================================================

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Public GitHub REST API
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Items per search page
pub const DEFAULT_PER_PAGE: u32 = 10;

/// Per-request timeout, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Validated settings for the GitHub client
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: Url,
    pub token: Option<String>,
    pub per_page: u32,
    pub timeout: Duration,
}

impl ApiConfig {
    // Builds a config from raw CLI/env values
    //
    // Parameters:
    //   api_url: base URL of the API (e.g. "https://api.github.com")
    //   token: personal access token; blank counts as "no token"
    //   timeout_secs: per-request timeout
    pub fn new(api_url: &str, token: Option<String>, timeout_secs: u64) -> Result<Self> {
        let base_url = Url::parse(api_url)
            .with_context(|| format!("Invalid API URL '{}'", api_url))?;

        if !matches!(base_url.scheme(), "http" | "https") {
            bail!("API URL must use http or https: {}", api_url);
        }
        if base_url.cannot_be_a_base() {
            bail!("API URL cannot be used as a base: {}", api_url);
        }
        if timeout_secs == 0 {
            bail!("Timeout must be at least one second");
        }

        let token = token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Ok(Self {
            base_url,
            token,
            per_page: DEFAULT_PER_PAGE,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// Loads a .env file if there is one
//
// Runs before logging is set up, so the outcome is returned for the caller
// to log. A missing file is Ok(None).
pub fn load_dotenv() -> std::result::Result<Option<PathBuf>, dotenvy::Error> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}
