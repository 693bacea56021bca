// src/session.rs
// =============================================================================
// The event loop that ties fetching, paging and scrolling together.
//
// One session owns:
// - the SearchController (what has been loaded, what to load next)
// - the ScrollTrigger and its Viewport (when to load next)
// - the page source (where pages come from)
//
// Everything runs on one thread. Fetches are spawned as tasks and report back
// through a channel, as do visibility notifications from the viewport:
//
//   submit_search ──► dispatch ──► [task: source.load_page] ──► PageLoaded ─┐
//                                                                            │
//   scroll ──► viewport fires ──► LastItemVisible ─────────────┐             │
//                                                              ▼             ▼
//                                                   handle(event) on the loop
//
// A fetch that was overtaken by a newer search still completes, but the
// controller recognizes its request as stale and drops the result.
//
// Every dispatched request produces exactly one PageLoaded event. A fetch
// that panics reports FetchError::Internal instead of going silent, so the
// controller never waits on a request that will not come back.
// =============================================================================

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::github::{FetchError, SearchPage};
use crate::search::{Applied, PageRequest, PageSource, SearchController};
use crate::view::{ItemKey, ScrollTrigger, Sighting, Viewport};

/// Something that happened while the loop was waiting
#[derive(Debug)]
pub enum SessionEvent {
    PageLoaded {
        request: PageRequest,
        outcome: Result<SearchPage, FetchError>,
    },
    LastItemVisible(Sighting),
}

/// What handle() did with an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    Page(Applied),
    /// The next page (this number) was requested
    NextPage(u32),
    Ignored,
}

pub struct Session {
    source: Arc<dyn PageSource>,
    controller: SearchController,
    trigger: ScrollTrigger<Viewport>,
    sender: mpsc::UnboundedSender<SessionEvent>,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    dispatched: usize,
}

impl Session {
    // Parameters:
    //   source: where pages come from (GitHubClient in production)
    //   viewport_height: how many rows fit on screen
    pub fn new(source: Arc<dyn PageSource>, viewport_height: usize) -> Self {
        let (sender, events) = mpsc::unbounded_channel();

        let visible_tx = sender.clone();
        let trigger = ScrollTrigger::new(Viewport::new(viewport_height), move |sighting| {
            // The receiver lives as long as the session; a failed send only
            // happens during teardown
            let _ = visible_tx.send(SessionEvent::LastItemVisible(sighting));
        });

        Self {
            source,
            controller: SearchController::new(),
            trigger,
            sender,
            events,
            dispatched: 0,
        }
    }

    /// Starts a new search. Returns false if the term was rejected.
    pub fn submit_search(&mut self, term: &str) -> bool {
        let request = self.controller.submit_search(term);

        let viewport = self.trigger.observer_mut();
        viewport.set_rows(Vec::new());
        viewport.scroll_to_top();
        self.trigger.sync(&self.controller);

        match request {
            Some(request) => {
                self.dispatch(request);
                true
            }
            None => false,
        }
    }

    /// Retries the page that just failed. Returns false if there is nothing to retry.
    pub fn retry(&mut self) -> bool {
        match self.controller.retry() {
            Some(request) => {
                self.trigger.sync(&self.controller);
                self.dispatch(request);
                true
            }
            None => false,
        }
    }

    /// Waits for the next event. Never returns None while the session is alive.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    /// Applies one event to the controller and the view.
    pub fn handle(&mut self, event: SessionEvent) -> Handled {
        match event {
            SessionEvent::PageLoaded { request, outcome } => {
                let applied = self.controller.apply(&request, outcome);
                match applied {
                    Applied::Replaced(_) => {
                        let rows = self.row_keys();
                        let viewport = self.trigger.observer_mut();
                        viewport.set_rows(rows);
                        viewport.scroll_to_top();
                    }
                    Applied::Appended(_) => {
                        let rows = self.row_keys();
                        self.trigger.observer_mut().set_rows(rows);
                    }
                    Applied::NoResults | Applied::Failed | Applied::Stale => {}
                }
                self.trigger.sync(&self.controller);
                Handled::Page(applied)
            }
            SessionEvent::LastItemVisible(sighting) => {
                match self.trigger.handle_visible(sighting, &mut self.controller) {
                    Some(request) => {
                        let page = request.page;
                        self.dispatch(request);
                        Handled::NextPage(page)
                    }
                    None => Handled::Ignored,
                }
            }
        }
    }

    /// Runs a search and keeps scrolling to the bottom until everything is
    /// loaded, something fails, or `max_pages` pages are in.
    pub async fn load_pages(&mut self, term: &str, max_pages: u32) -> &SearchController {
        if !self.submit_search(term) {
            return &self.controller;
        }

        while let Some(event) = self.next_event().await {
            self.handle(event);

            if self.controller.is_loading() {
                continue;
            }
            if !self.controller.can_request_more() || self.controller.page() >= max_pages {
                break;
            }

            // Reading to the bottom makes the last row visible, which queues
            // the trigger's LastItemVisible event
            self.trigger.observer_mut().scroll_to_end();
        }

        &self.controller
    }

    pub fn scroll_by(&mut self, rows: isize) {
        self.trigger.observer_mut().scroll_by(rows);
    }

    pub fn page_down(&mut self) {
        self.trigger.observer_mut().page_down();
    }

    pub fn controller(&self) -> &SearchController {
        &self.controller
    }

    pub fn viewport(&self) -> &Viewport {
        self.trigger.observer()
    }

    /// Number of fetches started so far
    #[cfg(test)]
    pub fn dispatched(&self) -> usize {
        self.dispatched
    }

    // Rows are identified by position; ids can repeat across pages
    fn row_keys(&self) -> Vec<ItemKey> {
        (0..self.controller.results().len()).collect()
    }

    // Runs one fetch as its own task; the outcome comes back as an event
    fn dispatch(&mut self, request: PageRequest) {
        self.dispatched += 1;
        debug!(
            term = %request.term,
            page = request.page,
            generation = request.generation,
            dispatched = self.dispatched,
            "dispatching fetch"
        );

        let source = Arc::clone(&self.source);
        let sender = self.sender.clone();
        tokio::spawn(async move {
            let outcome = AssertUnwindSafe(source.load_page(&request.term, request.page))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    let message = panic_message(&*panic);
                    error!(page = request.page, "fetch task panicked: {}", message);
                    Err(FetchError::Internal(message))
                });
            let _ = sender.send(SessionEvent::PageLoaded { request, outcome });
        });
    }
}

// Best-effort text of a panic payload
fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(text) = panic.downcast_ref::<&str>() {
        text.to_string()
    } else if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why Arc<dyn PageSource>?
//    - Arc = shared ownership, so each spawned task can hold the source
//    - dyn PageSource lets tests plug in a fake instead of GitHubClient
//
// 2. What is an unbounded mpsc channel?
//    - mpsc = multi-producer, single-consumer
//    - Fetch tasks and the viewport callback all send; the session receives
//    - Unbounded means send() never waits
//
// 3. What does catch_unwind do here?
//    - A panic inside the fetch would normally just kill the task
//    - catch_unwind turns it into an Err we can report like any failure
//    - AssertUnwindSafe tells the compiler we accept that risk for this future
//
// 4. Why does load_pages return &SearchController?
//    - The caller only needs to read the results
//    - Returning a reference avoids copying every RepoItem
// -----------------------------------------------------------------------------
