// src/browse.rs
// =============================================================================
// Interactive mode: type a search, scroll through results, open one.
//
// The loop waits on two things at once:
// - a line typed on stdin (a command)
// - a session event (a page arrived, or the last row became visible)
//
// Commands:
//   /<keywords>   search (a new search replaces the old one, even mid-load)
//   <enter> or j  scroll down one screen (loads more at the bottom)
//   k             scroll up one screen
//   r             retry the page that failed
//   o <n>         open result number n
//   h or ?        help
//   q             quit
// =============================================================================

use anyhow::{Context, Result};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::github::GitHubClient;
use crate::search::Applied;
use crate::session::{Handled, Session};
use crate::view::{print_detail, print_table, status_line};

#[derive(Debug, PartialEq, Eq)]
enum BrowseCommand {
    Search(String),
    Down,
    Up,
    Retry,
    Open(usize),
    Help,
    Quit,
    Unknown(String),
}

// Parses one line typed by the user
fn parse_command(line: &str) -> BrowseCommand {
    let line = line.trim();

    if let Some(term) = line.strip_prefix('/') {
        return BrowseCommand::Search(term.to_string());
    }

    match line {
        "" | "j" => BrowseCommand::Down,
        "k" => BrowseCommand::Up,
        "r" => BrowseCommand::Retry,
        "h" | "?" => BrowseCommand::Help,
        "q" | "quit" | "exit" => BrowseCommand::Quit,
        _ => match line.strip_prefix("o ").map(|n| n.trim().parse::<usize>()) {
            Some(Ok(n)) if n > 0 => BrowseCommand::Open(n),
            _ => BrowseCommand::Unknown(line.to_string()),
        },
    }
}

pub async fn run(client: GitHubClient, viewport_height: usize) -> Result<i32> {
    let mut session = Session::new(Arc::new(client.clone()), viewport_height);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print_help();
    prompt();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                // EOF (Ctrl-D) ends the session like 'q'
                let Some(line) = line.context("Failed to read from stdin")? else {
                    break;
                };

                match parse_command(&line) {
                    BrowseCommand::Quit => break,
                    BrowseCommand::Search(term) => {
                        if session.submit_search(&term) {
                            println!("🔍 Searching for: {}", term.trim());
                        } else {
                            print_status(&session);
                        }
                    }
                    BrowseCommand::Down => {
                        session.page_down();
                        render_window(&session);
                    }
                    BrowseCommand::Up => {
                        let height = isize::try_from(session.viewport().height()).unwrap_or(isize::MAX);
                        session.scroll_by(-height);
                        render_window(&session);
                    }
                    BrowseCommand::Retry => {
                        if session.retry() {
                            println!("🔁 Retrying page {}", session.controller().page());
                        } else {
                            println!("Nothing to retry");
                        }
                    }
                    BrowseCommand::Open(n) => open_result(&client, &session, n).await,
                    BrowseCommand::Help => print_help(),
                    BrowseCommand::Unknown(text) => {
                        println!("Unknown command: {} (type 'h' for help)", text);
                    }
                }
                prompt();
            }
            Some(event) = session.next_event() => {
                match session.handle(event) {
                    Handled::Page(Applied::Replaced(_) | Applied::Appended(_)) => {
                        render_window(&session);
                        prompt();
                    }
                    Handled::Page(Applied::NoResults | Applied::Failed) => {
                        print_status(&session);
                        if session.controller().can_retry() {
                            println!("Type 'r' to retry");
                        }
                        prompt();
                    }
                    Handled::NextPage(page) => println!("⏳ Loading page {}...", page),
                    Handled::Page(Applied::Stale) | Handled::Ignored => {}
                }
            }
        }
    }

    Ok(0)
}

// Prints the rows currently inside the viewport plus a position footer
fn render_window(session: &Session) {
    let results = session.controller().results();
    if results.is_empty() {
        print_status(session);
        return;
    }

    let range = session.viewport().visible_range();
    println!();
    print_table(&results[range.clone()], range.start);

    let controller = session.controller();
    let term = controller.query().map(|q| q.term()).unwrap_or_default();
    let total = controller
        .total_count()
        .map(|t| format!(" of {}", t))
        .unwrap_or_default();
    println!(
        "-- '{}': rows {}-{} of {} loaded{} --",
        term,
        range.start + 1,
        range.end,
        results.len(),
        total
    );
    print_status(session);
}

fn print_status(session: &Session) {
    if let Some(line) = status_line(session.controller().state()) {
        println!("{}", line);
    }
}

// Fetches and prints the detail view of the n-th (1-based) result
async fn open_result(client: &GitHubClient, session: &Session, n: usize) {
    let Some(item) = session.controller().results().get(n - 1) else {
        println!("No result #{}", n);
        return;
    };

    match client.fetch_detail(&item.owner.login, &item.name).await {
        Ok(details) => {
            println!();
            // Table output cannot fail; only JSON serialization can
            let _ = print_detail(&details, false);
        }
        Err(e) => println!("❌ {}", e.user_message()),
    }
}

fn prompt() {
    print!("> ");
    // Nothing useful to do if stdout is gone
    let _ = std::io::stdout().flush();
}

fn print_help() {
    println!("Commands:");
    println!("  /<keywords>   search repositories");
    println!("  <enter>, j    scroll down (loads more at the bottom)");
    println!("  k             scroll up");
    println!("  r             retry a failed page");
    println!("  o <n>         open result n");
    println!("  h, ?          show this help");
    println!("  q             quit");
}
