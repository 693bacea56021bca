// src/github/error.rs
// =============================================================================
// Typed failures of the GitHub fetcher.
//
// Every way a fetch can go wrong ends up as one FetchError variant, so callers
// match on an enum instead of digging through strings:
//
//   Validation   - bad input, caught before any request is sent
//   RateLimited  - 403 "API rate limit exceeded" (or 429)
//   NotFound     - 404 on the detail endpoint
//   Upstream     - any other non-2xx, with the upstream JSON body attached
//   Network      - transport, timeout or body decoding failure
//   Internal     - the fetch itself blew up (a panic in the fetch task)
//
// Nothing here retries. Retrying is up to whoever holds the error.
// =============================================================================

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Substring GitHub puts in the `message` of a primary rate-limit 403
const RATE_LIMIT_MARKER: &str = "API rate limit exceeded";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("GitHub API rate limit exceeded: {message}")]
    RateLimited { message: String },

    #[error("repository not found")]
    NotFound,

    #[error("GitHub API returned HTTP {status}: {details}")]
    Upstream { status: u16, details: Value },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl FetchError {
    /// Short text meant for the person looking at the screen
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Validation(reason) => reason.clone(),
            FetchError::RateLimited { .. } => {
                "GitHub API rate limit exceeded. Please wait a while and try again.".to_string()
            }
            FetchError::NotFound => "Repository not found.".to_string(),
            FetchError::Upstream { status, .. } => {
                format!("Failed to fetch from the GitHub API (HTTP {status}).")
            }
            FetchError::Network(e) => network_message(e).to_string(),
            FetchError::Internal(_) => "Something went wrong. Please try again.".to_string(),
        }
    }
}

// Which upstream endpoint produced a failure.
//
// A 404 only means "no such repository" on the detail lookup; on search it
// is just another upstream error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Search,
    Detail,
}

// Turns a non-2xx upstream response into a FetchError
//
// Parameters:
//   status: HTTP status of the upstream response
//   body: raw response body (usually JSON with a "message" field)
//   endpoint: which endpoint we called
pub fn classify_failure(status: StatusCode, body: &str, endpoint: Endpoint) -> FetchError {
    // Keep whatever the upstream said; fall back to the raw text if it isn't JSON
    let details: Value =
        serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()));

    let message = details
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    if status == StatusCode::FORBIDDEN && message.contains(RATE_LIMIT_MARKER) {
        return FetchError::RateLimited { message };
    }

    // Secondary rate limits come back as 429
    if status == StatusCode::TOO_MANY_REQUESTS {
        return FetchError::RateLimited { message };
    }

    if status == StatusCode::NOT_FOUND && endpoint == Endpoint::Detail {
        return FetchError::NotFound;
    }

    FetchError::Upstream {
        status: status.as_u16(),
        details,
    }
}

// Categorizes transport errors from reqwest into a short description
fn network_message(error: &reqwest::Error) -> &'static str {
    if error.is_timeout() {
        "The GitHub API did not respond in time."
    } else if error.is_connect() {
        "Could not connect to the GitHub API."
    } else if error.is_decode() {
        "The GitHub API returned a response we could not read."
    } else {
        "A network error occurred."
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What does #[derive(Error)] give us?
//    - thiserror writes the Display and std::error::Error impls for us
//    - The #[error("...")] text becomes the Display output
//
// 2. Why keep `details` as serde_json::Value?
//    - GitHub error bodies vary; Value holds any JSON without a fixed struct
//    - It is printed as-is in debug logs
//
// 3. Why both Display and user_message()?
//    - Display is for logs and developers (it includes technical detail)
//    - user_message() is the short sentence shown in the result list
// -----------------------------------------------------------------------------
