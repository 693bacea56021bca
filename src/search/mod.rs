// src/search/mod.rs
// =============================================================================
// Search-result list management.
//
// Submodules:
// - controller: page number, accumulated results, load state
// - source: the trait the session fetches pages through
// =============================================================================

mod controller;
mod source;

pub use controller::{Applied, LoadState, PageRequest, SearchController};

#[cfg(test)]
pub use controller::NO_RESULTS_MESSAGE;
pub use source::PageSource;
