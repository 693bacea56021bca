// src/view/render.rs
// =============================================================================
// Turns results into terminal output: a table, a detail card, or JSON.
//
// JSON output uses the same shapes a browser client gets from the search
// and detail endpoints, so scripts can consume either.
// =============================================================================

use anyhow::Result;

use crate::github::{RepoDetails, RepoItem, SearchPage};
use crate::search::{LoadState, SearchController};

const NAME_WIDTH: usize = 44;
const LANGUAGE_WIDTH: usize = 12;

// Prints the accumulated results either as a table or JSON
//
// Parameters:
//   controller: holds the results and the provider-reported total
//   json: whether to output JSON format
pub fn print_results(controller: &SearchController, json: bool) -> Result<()> {
    if json {
        // Same shape as a single page, with everything loaded so far
        let page = SearchPage {
            total_count: controller.total_count().unwrap_or(0),
            items: controller.results().to_vec(),
            total_available: controller.total_available().unwrap_or(0),
        };
        println!("{}", serde_json::to_string_pretty(&page)?);
    } else {
        print_table(controller.results(), 0);
        println!();
        print_summary(controller);
    }
    Ok(())
}

// Prints rows as a table; `first_index` is the list position of rows[0]
pub fn print_table(rows: &[RepoItem], first_index: usize) {
    println!(
        "{:>4}  {:<name$} {:>9} {:<lang$}",
        "#",
        "REPOSITORY",
        "STARS",
        "LANGUAGE",
        name = NAME_WIDTH,
        lang = LANGUAGE_WIDTH
    );
    println!("{}", "=".repeat(4 + 2 + NAME_WIDTH + 1 + 9 + 1 + LANGUAGE_WIDTH));

    for (i, repo) in rows.iter().enumerate() {
        println!("{}", format_row(first_index + i + 1, repo));
    }
}

// One table row, 1-based position first
fn format_row(position: usize, repo: &RepoItem) -> String {
    format!(
        "{:>4}  {:<name$} {:>9} {:<lang$}",
        position,
        truncate(&repo.full_name, NAME_WIDTH),
        format_count(repo.stargazers_count),
        truncate(repo.language.as_deref().unwrap_or("-"), LANGUAGE_WIDTH),
        name = NAME_WIDTH,
        lang = LANGUAGE_WIDTH
    )
}

// Prints the footer under the table
fn print_summary(controller: &SearchController) {
    println!("{}", summary_line(controller));
    if let Some(line) = status_line(controller.state()) {
        println!("{}", line);
    }
}

// "Showing X of Y" where Y is the provider's own match count
fn summary_line(controller: &SearchController) -> String {
    let loaded = controller.results().len();
    let mut line = match controller.total_count() {
        Some(total) => format!("📊 Showing {} of {} repositories", loaded, format_count(total)),
        None => format!("📊 Showing {} repositories", loaded),
    };
    // Idle with more to load means we stopped at the page limit
    if controller.state() == &LoadState::Idle && controller.has_more() {
        line.push_str(" (more available, raise --pages)");
    }
    line
}

/// Short status text for the current load state (None when idle)
pub fn status_line(state: &LoadState) -> Option<String> {
    match state {
        LoadState::Idle => None,
        LoadState::Loading => Some("⏳ Loading...".to_string()),
        LoadState::Error(message) => Some(format!("❌ {}", message)),
        LoadState::Exhausted => Some("✅ All results loaded".to_string()),
    }
}

// Prints a single repository as a detail card or JSON
pub fn print_detail(repo: &RepoItem, json: bool) -> Result<()> {
    if json {
        let wrapped = RepoDetails { repo_details: repo };
        println!("{}", serde_json::to_string_pretty(&wrapped)?);
        return Ok(());
    }

    println!("{}", repo.full_name);
    println!("{}", "-".repeat(repo.full_name.chars().count()));
    if let Some(description) = &repo.description {
        println!("{}", description);
        println!();
    }
    println!("  Owner:     {} ({})", repo.owner.login, repo.owner.avatar_url);
    println!("  Language:  {}", repo.language.as_deref().unwrap_or("N/A"));
    println!("  Stars:     {}", format_count(repo.stargazers_count));
    println!("  Watchers:  {}", format_count(repo.watchers_count));
    println!("  Forks:     {}", format_count(repo.forks_count));
    println!("  Issues:    {}", format_count(repo.open_issues_count));
    println!("  URL:       {}", repo.html_url);
    Ok(())
}

/// Formats a count with thousands separators: 1234567 -> "1,234,567"
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// Shortens text to `max` characters, marking the cut with "..."
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}
