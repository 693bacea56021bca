// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Global options (API URL, token, timeout) can also come from environment
// variables, and those in turn from a .env file. The precedence is
// flag > environment > default.
//
// Subcommands:
// - search: run a search and load pages the way scrolling to the bottom would
// - show:   print the details of one repository
// - browse: interactive search with infinite scrolling
// =============================================================================

use clap::{Parser, Subcommand};

use crate::config::{DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};

// This struct represents our entire CLI application
#[derive(Parser, Debug)]
#[command(
    name = "repo-scout",
    version,
    about = "Search GitHub repositories from the terminal",
    long_about = "repo-scout searches GitHub repositories by keyword, most-starred first. \
                  Results load ten at a time as you scroll, and any result can be opened \
                  for details. Set GITHUB_TOKEN to raise the API rate limit."
)]
pub struct Cli {
    /// Base URL of the GitHub REST API
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub api_url: String,

    /// GitHub personal access token, sent as a bearer token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = "REPO_SCOUT_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    pub timeout: u64,

    /// Log debug output to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search repositories by keyword, most stars first
    ///
    /// Example: repo-scout search async runtime --pages 3
    Search {
        /// Search keywords (joined with spaces)
        #[arg(required = true, num_args = 1..)]
        term: Vec<String>,

        /// Load up to this many pages of 10 results
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        pages: u32,

        /// Rows visible at once; the next page loads when the last row scrolls into view
        #[arg(long, default_value_t = 8, value_parser = clap::value_parser!(u16).range(1..))]
        viewport: u16,

        /// Output results in JSON format instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show details of a single repository
    ///
    /// Example: repo-scout show rust-lang/rust
    Show {
        /// Repository as owner/repo or a github.com URL
        repo: String,

        /// Output in JSON format instead of a detail card
        #[arg(long)]
        json: bool,
    },

    /// Interactive search with infinite scrolling
    Browse {
        /// Rows visible at once
        #[arg(long, default_value_t = 8, value_parser = clap::value_parser!(u16).range(1..))]
        viewport: u16,
    },
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What does `env = "GITHUB_TOKEN"` do?
//    - If the flag is not given, clap reads the environment variable instead
//    - Needs the 'env' feature of clap (see Cargo.toml)
//    - hide_env_values keeps the token out of --help output
//
// 2. What is `global = true`?
//    - The flag is accepted before or after the subcommand
//    - `repo-scout --timeout 3 search x` and `repo-scout search x --timeout 3`
//      both work
//
// 3. Why Vec<String> for the search term?
//    - `repo-scout search async runtime` arrives as two words
//    - num_args = 1.. collects them all, and main joins them with spaces
//
// 4. What does value_parser!(u32).range(1..) do?
//    - Rejects 0 at parse time, so the rest of the code never sees it
//    - clap prints a friendly error instead of us checking by hand
// -----------------------------------------------------------------------------
