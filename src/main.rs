// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Load .env, parse command-line arguments, set up logging
// 2. Build the GitHub client from the validated configuration
// 3. Dispatch to the appropriate subcommand handler
// 4. Exit with proper code (0 = success, 1 = nothing found or fetch failed,
//    2 = internal error)
// =============================================================================

mod browse;        // src/browse.rs - interactive mode
mod cli;           // src/cli.rs - command-line parsing
mod config;        // src/config.rs - API settings
mod github;        // src/github/ - GitHub REST client
mod search;        // src/search/ - pagination state machine
mod session;       // src/session.rs - event loop tying fetch and scroll together
mod view;          // src/view/ - viewport, load trigger, output

// anyhow::Result lets us return any error type with the ? operator
use anyhow::Result;
use clap::Parser;  // Parser trait enables the parse() method
use std::sync::Arc;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use config::ApiConfig;
use github::{FetchError, GitHubClient};
use search::LoadState;
use session::Session;

// Everything runs on one thread; fetches are tasks, not threads
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Run our application logic and capture the exit code
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    // std::process::exit() terminates the program with the given code
    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = success
//   Ok(1) = nothing found, or the API request failed
//   Err = invalid configuration or unexpected error
async fn run() -> Result<i32> {
    // Must happen before clap reads env vars
    let dotenv = config::load_dotenv();

    // Parse command-line arguments into our Cli struct
    // This will automatically handle --help, --version, etc.
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Only now can we log what happened with .env
    match dotenv {
        Ok(Some(path)) => debug!("loaded environment from {}", path.display()),
        Ok(None) => {}
        Err(e) => warn!("ignoring .env file: {}", e),
    }

    // Bad configuration is an error (exit code 2), not a failed search
    let config = ApiConfig::new(&cli.api_url, cli.token, cli.timeout)?;
    debug!(base_url = %config.base_url, authenticated = config.token.is_some(), "using GitHub API");
    let client = GitHubClient::new(&config)?;

    // Match on which subcommand was used
    match cli.command {
        Commands::Search { term, pages, viewport, json } => {
            handle_search(client, &term.join(" "), pages, viewport.into(), json).await
        }
        Commands::Show { repo, json } => handle_show(&client, &repo, json).await,
        Commands::Browse { viewport } => browse::run(client, viewport.into()).await,
    }
}

// Logs go to stderr so stdout stays clean for --json
//
// RUST_LOG wins when set; otherwise -v turns on this crate's debug output.
fn init_logging(verbose: bool) {
    let default = if verbose { "repo_scout=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// Handles the 'search' subcommand
// Parameters:
//   client: GitHub client
//   term: search keywords
//   max_pages: stop after this many pages even if more exist
//   viewport: rows visible at once
//   json: whether to output JSON format
async fn handle_search(
    client: GitHubClient,
    term: &str,
    max_pages: u32,
    viewport: usize,
    json: bool,
) -> Result<i32> {
    if !json {
        println!("🔍 Searching GitHub for: {}", term.trim());
    }

    // The session scrolls to the bottom after every page, just like a reader
    // would, until everything is loaded or max_pages is reached
    let mut session = Session::new(Arc::new(client), viewport);
    let controller = session.load_pages(term, max_pages).await;

    if controller.results().is_empty() {
        // Blank term, no matches, or the first page failed
        if let LoadState::Error(message) = controller.state() {
            eprintln!("❌ {}", message);
        }
        return Ok(1);
    }

    view::print_results(controller, json)?;

    // Results from earlier pages are still printed when a later page fails
    match controller.state() {
        LoadState::Error(message) => {
            if json {
                eprintln!("❌ {}", message);
            }
            Ok(1)
        }
        _ => Ok(0),
    }
}

// Handles the 'show' subcommand
// Parameters:
//   client: GitHub client
//   repo: "owner/repo" or a github.com URL
//   json: whether to output JSON format
async fn handle_show(client: &GitHubClient, repo: &str, json: bool) -> Result<i32> {
    let (owner, name) = match github::parse_repo_ref(repo) {
        Ok(parts) => parts,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            return Ok(1);
        }
    };

    // NotFound gets its own message; everything else uses the generic one
    match client.fetch_detail(&owner, &name).await {
        Ok(details) => {
            view::print_detail(&details, json)?;
            Ok(0)
        }
        Err(FetchError::NotFound) => {
            eprintln!("❌ Repository {}/{} not found", owner, name);
            Ok(1)
        }
        Err(e) => {
            debug!(error = ?e, "detail fetch failed");
            eprintln!("❌ {}", e.user_message());
            Ok(1)
        }
    }
}
