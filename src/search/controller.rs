// src/search/controller.rs
// =============================================================================
// The incremental-load controller behind the infinite-scrolling result list.
//
// It owns:
// - the current query and page number
// - the accumulated result set (append-only while a query is active)
// - the "more data available" flag
// - the load state: Idle, Loading, Error(message) or Exhausted
//
// The controller does no I/O. Operations that need data hand back a
// PageRequest; whoever runs the event loop fetches it and feeds the outcome
// into apply(). That keeps the state machine synchronous and easy to test.
//
// State machine:
//
//   Idle --submit_search / request_next_page--> Loading
//   Loading --apply(Ok, more left)--> Idle
//   Loading --apply(Ok, all loaded)--> Exhausted
//   Loading --apply(Err) / total 0--> Error
//   any --submit_search--> Loading (or Error for a blank term)
//
// Stale responses:
// Every submit_search bumps a generation counter and each PageRequest carries
// the generation and page it was issued for. apply() only accepts the request
// that is currently in flight, so a slow response for an old query can never
// land in the new query's list.
// =============================================================================

use tracing::{debug, warn};

use crate::github::{FetchError, RepoItem, SearchPage};

/// Shown when the search box is empty or only whitespace
pub const EMPTY_TERM_MESSAGE: &str = "Please enter a search keyword.";

/// Shown when the provider reports zero matches
pub const NO_RESULTS_MESSAGE: &str = "No repositories matched your search.";

/// Where the controller is in its load cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Error(String),
    /// Every item the provider reported has been loaded
    Exhausted,
}

/// A submitted search term (stored trimmed)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    term: String,
}

impl Query {
    pub fn term(&self) -> &str {
        &self.term
    }
}

/// A page the caller has to fetch on the controller's behalf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub generation: u64,
    pub term: String,
    pub page: u32,
}

/// What apply() did with an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Page 1 replaced the result set (number of items kept)
    Replaced(usize),
    /// A later page was appended (number of items added)
    Appended(usize),
    NoResults,
    Failed,
    /// Not the request in flight; dropped without touching state
    Stale,
}

#[derive(Debug)]
pub struct SearchController {
    query: Option<Query>,
    page: u32,
    results: Vec<RepoItem>,
    has_more: bool,
    state: LoadState,
    total_available: Option<usize>,
    // As reported by the provider, before the search cap
    total_count: Option<u64>,
    generation: u64,
    in_flight: Option<PageRequest>,
    // Set when the last fetch failed, so retry() can re-issue the same page
    retryable: bool,
}

impl Default for SearchController {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchController {
    pub fn new() -> Self {
        Self {
            query: None,
            page: 0,
            results: Vec::new(),
            has_more: true,
            state: LoadState::Idle,
            total_available: None,
            total_count: None,
            generation: 0,
            in_flight: None,
            retryable: false,
        }
    }

    /// Starts a new query, superseding whatever was going on before.
    ///
    /// Returns the page-1 request to fetch, or `None` if the term is blank
    /// (in which case the state becomes an error and nothing is fetched).
    pub fn submit_search(&mut self, term: &str) -> Option<PageRequest> {
        // Anything still in flight belongs to an older query from now on
        self.generation += 1;
        self.in_flight = None;
        self.results.clear();
        self.total_available = None;
        self.total_count = None;
        self.retryable = false;
        self.has_more = true;

        let term = term.trim();
        if term.is_empty() {
            debug!("rejected blank search term");
            self.query = None;
            self.page = 0;
            self.state = LoadState::Error(EMPTY_TERM_MESSAGE.to_string());
            return None;
        }

        debug!(term, generation = self.generation, "new search");
        self.query = Some(Query {
            term: term.to_string(),
        });
        self.page = 1;
        Some(self.issue(term.to_string()))
    }

    /// Asks for the next page of the current query.
    ///
    /// No-op unless the controller is Idle, has more to load and has
    /// nothing in flight.
    pub fn request_next_page(&mut self) -> Option<PageRequest> {
        if !self.can_request_more() {
            debug!(state = ?self.state, has_more = self.has_more, "next page not requested");
            return None;
        }

        let term = self.query.as_ref()?.term.clone();
        self.page += 1;
        Some(self.issue(term))
    }

    /// Re-issues the page whose fetch just failed.
    pub fn retry(&mut self) -> Option<PageRequest> {
        if !self.retryable || self.in_flight.is_some() {
            return None;
        }

        let term = self.query.as_ref()?.term.clone();
        self.retryable = false;
        debug!(page = self.page, "retrying page");
        Some(self.issue(term))
    }

    /// Feeds the outcome of a fetch back into the state machine.
    pub fn apply(
        &mut self,
        request: &PageRequest,
        outcome: Result<SearchPage, FetchError>,
    ) -> Applied {
        if self.in_flight.as_ref() != Some(request) {
            debug!(
                generation = request.generation,
                page = request.page,
                current_generation = self.generation,
                "discarding stale page"
            );
            return Applied::Stale;
        }
        self.in_flight = None;

        let SearchPage {
            total_count,
            mut items,
            total_available,
        } = match outcome {
            Ok(page) => page,
            Err(error) => {
                warn!(page = request.page, "search failed: {}", error);
                self.state = LoadState::Error(error.user_message());
                self.retryable = true;
                return Applied::Failed;
            }
        };

        if total_available == 0 {
            self.state = LoadState::Error(NO_RESULTS_MESSAGE.to_string());
            return Applied::NoResults;
        }

        if request.page == 1 {
            self.results.clear();
        }

        // Never hold more than the provider says exists
        let received = items.len();
        items.truncate(total_available.saturating_sub(self.results.len()));
        let added = items.len();
        self.results.extend(items);
        self.total_available = Some(total_available);
        self.total_count = Some(total_count);

        // An empty batch means the provider has nothing further to give
        self.has_more = received > 0 && self.results.len() < total_available;
        self.state = if self.has_more {
            LoadState::Idle
        } else {
            LoadState::Exhausted
        };

        debug!(
            page = request.page,
            added,
            loaded = self.results.len(),
            total_available,
            state = ?self.state,
            "page applied"
        );

        if request.page == 1 {
            Applied::Replaced(added)
        } else {
            Applied::Appended(added)
        }
    }

    // Marks a request as in flight for the current page
    fn issue(&mut self, term: String) -> PageRequest {
        let request = PageRequest {
            generation: self.generation,
            term,
            page: self.page,
        };
        self.state = LoadState::Loading;
        self.in_flight = Some(request.clone());
        request
    }

    /// True when request_next_page() would actually issue a request
    pub fn can_request_more(&self) -> bool {
        self.state == LoadState::Idle
            && self.has_more
            && self.in_flight.is_none()
            && self.query.is_some()
    }

    pub fn can_retry(&self) -> bool {
        self.retryable && self.in_flight.is_none()
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn results(&self) -> &[RepoItem] {
        &self.results
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    /// Last page requested (0 before any search)
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn query(&self) -> Option<&Query> {
        self.query.as_ref()
    }

    pub fn total_available(&self) -> Option<usize> {
        self.total_available
    }

    /// Match count the provider reported for the current query
    pub fn total_count(&self) -> Option<u64> {
        self.total_count
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What does "sans-IO" mean?
//    - The controller never touches the network
//    - It returns a PageRequest describing what to fetch, and apply() takes
//      the result, so tests can feed in any outcome they like
//
// 2. Why Option<PageRequest> as a return type?
//    - Some(request) = "please fetch this"
//    - None = "nothing to do right now" (loading, exhausted, blank term)
//
// 3. Why compare the whole PageRequest in apply()?
//    - PageRequest derives PartialEq, so == checks generation, term and page
//    - Anything other than the request in flight is an old answer
// -----------------------------------------------------------------------------
