// src/view/trigger.rs
// =============================================================================
// Binds "the last rendered item became visible" to "load the next page".
//
// How it works:
// 1. After every state change, sync() looks at the controller
// 2. If more pages can be loaded, it observes the last item in the list
//    (and stops observing whatever item was last before)
// 3. When the observer reports that item as visible, handle_visible() asks
//    the controller for the next page, once
// 4. While a page is loading, or once everything is loaded, nothing is
//    observed at all, so fast scrolling cannot stack up requests
//
// Rows are keyed by their position in the result list, not by repository id:
// the same repository can show up on two pages, and only the real last row
// may trigger a load.
//
// Every observation gets its own watch number, carried in the Sighting the
// callback reports. A sighting queued by an observation that has since been
// replaced (new search, new last row) is recognized and ignored.
//
// How visibility is detected is not our business: anything implementing
// VisibilityObserver will do (a terminal viewport, a test double, ...).
// =============================================================================

use std::sync::Arc;
use tracing::debug;

use crate::search::{PageRequest, SearchController};

/// Identifies a rendered row: its position in the result list
pub type ItemKey = usize;

/// "This row became visible", as reported by one particular observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sighting {
    pub key: ItemKey,
    watch: u64,
}

/// Callback invoked with the observed key when it becomes visible
pub type OnVisible = Box<dyn FnMut(ItemKey) + Send>;

/// Capability to watch a single rendered item for visibility.
pub trait VisibilityObserver {
    /// Handle returned by observe(); hand it back to unsubscribe()
    type Subscription;

    /// Starts watching `target`. `on_visible` fires once it enters the viewport.
    fn observe(&mut self, target: ItemKey, on_visible: OnVisible) -> Self::Subscription;

    fn unsubscribe(&mut self, subscription: Self::Subscription);
}

// The one observation we currently hold
struct Watch<S> {
    id: u64,
    target: ItemKey,
    subscription: S,
    fired: bool,
}

/// Fetch-more trigger bound to the last item of the result list.
pub struct ScrollTrigger<O: VisibilityObserver> {
    observer: O,
    notify: Arc<dyn Fn(Sighting) + Send + Sync>,
    watch: Option<Watch<O::Subscription>>,
    next_watch: u64,
}

impl<O: VisibilityObserver> ScrollTrigger<O> {
    // Parameters:
    //   observer: the visibility mechanism (owned by the trigger)
    //   notify: called when the watched row shows up;
    //           typically forwards an event to the session loop
    pub fn new(observer: O, notify: impl Fn(Sighting) + Send + Sync + 'static) -> Self {
        Self {
            observer,
            notify: Arc::new(notify),
            watch: None,
            next_watch: 0,
        }
    }

    /// Re-points the observation at the controller's current last item.
    pub fn sync(&mut self, controller: &SearchController) {
        let target = controller
            .results()
            .len()
            .checked_sub(1)
            .filter(|_| controller.can_request_more());

        let current = self
            .watch
            .as_ref()
            .filter(|w| !w.fired)
            .map(|w| w.target);
        if target.is_some() && current == target {
            return;
        }

        self.detach();
        if let Some(key) = target {
            self.attach(key);
        }
    }

    /// Handles a visibility notification; returns the page request to dispatch.
    pub fn handle_visible(
        &mut self,
        sighting: Sighting,
        controller: &mut SearchController,
    ) -> Option<PageRequest> {
        match self.watch.as_mut() {
            Some(watch) if watch.id == sighting.watch && !watch.fired => watch.fired = true,
            _ => {
                debug!(key = sighting.key, "ignoring sighting from an old observation");
                return None;
            }
        }

        let request = controller.request_next_page();
        // Loading now, so this drops the observation until the page lands
        self.sync(controller);
        request
    }

    /// Stops observing, if anything is observed.
    pub fn detach(&mut self) {
        if let Some(watch) = self.watch.take() {
            debug!(key = watch.target, "detaching from last item");
            self.observer.unsubscribe(watch.subscription);
        }
    }

    /// Key of the item currently observed
    #[cfg(test)]
    pub fn watched(&self) -> Option<ItemKey> {
        self.watch.as_ref().map(|w| w.target)
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    fn attach(&mut self, target: ItemKey) {
        self.next_watch += 1;
        let id = self.next_watch;

        debug!(key = target, watch = id, "observing last item");
        let notify = Arc::clone(&self.notify);
        let subscription = self
            .observer
            .observe(target, Box::new(move |key| notify(Sighting { key, watch: id })));
        self.watch = Some(Watch {
            id,
            target,
            subscription,
            fired: false,
        });
    }
}

impl<O: VisibilityObserver> Drop for ScrollTrigger<O> {
    fn drop(&mut self) {
        self.detach();
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is an associated type (type Subscription)?
//    - Each observer picks its own handle type
//    - The trigger stores it without caring what it is
//
// 2. Why Box<dyn FnMut(ItemKey) + Send>?
//    - Closures all have different, unnameable types
//    - Boxing them gives one type the observer can store in a Vec
//
// 3. Why implement Drop?
//    - When the trigger goes away, its observation must go too
//    - Drop runs automatically, so nobody can forget to clean up
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::fixtures::page;
    use std::sync::Mutex;

    // Observer double that records calls and fires on demand
    #[derive(Default)]
    struct RecordingObserver {
        next: usize,
        active: Vec<(usize, ItemKey, OnVisible)>,
        observed: Vec<ItemKey>,
        unsubscribed: Vec<usize>,
    }

    impl RecordingObserver {
        fn fire(&mut self, key: ItemKey) {
            for (_, target, callback) in self.active.iter_mut() {
                if *target == key {
                    callback(key);
                }
            }
        }
    }

    impl VisibilityObserver for RecordingObserver {
        type Subscription = usize;

        fn observe(&mut self, target: ItemKey, on_visible: OnVisible) -> usize {
            self.next += 1;
            self.active.push((self.next, target, on_visible));
            self.observed.push(target);
            self.next
        }

        fn unsubscribe(&mut self, subscription: usize) {
            self.active.retain(|(id, _, _)| *id != subscription);
            self.unsubscribed.push(subscription);
        }
    }

    fn trigger() -> (ScrollTrigger<RecordingObserver>, Arc<Mutex<Vec<Sighting>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let trigger = ScrollTrigger::new(RecordingObserver::default(), move |key| {
            sink.lock().unwrap().push(key);
        });
        (trigger, seen)
    }

    fn keys(seen: &Mutex<Vec<Sighting>>) -> Vec<ItemKey> {
        seen.lock().unwrap().iter().map(|s| s.key).collect()
    }

    fn loaded_controller(count: u64, total: usize) -> SearchController {
        let mut c = SearchController::new();
        let req = c.submit_search("test").unwrap();
        c.apply(&req, Ok(page(0, count, total)));
        c
    }

    #[test]
    fn test_observes_last_item_when_more_available() {
        let (mut t, _) = trigger();
        let c = loaded_controller(10, 25);

        t.sync(&c);
        assert_eq!(t.watched(), Some(9));
        assert_eq!(t.observer().observed, vec![9]);
    }

    #[test]
    fn test_sync_is_idempotent() {
        let (mut t, _) = trigger();
        let c = loaded_controller(10, 25);

        t.sync(&c);
        t.sync(&c);
        assert_eq!(t.observer().observed.len(), 1);
        assert!(t.observer().unsubscribed.is_empty());
    }

    #[test]
    fn test_nothing_observed_while_loading_or_exhausted() {
        let (mut t, _) = trigger();
        let mut c = SearchController::new();
        let _req = c.submit_search("test").unwrap();
        t.sync(&c);
        assert_eq!(t.watched(), None);

        let c = loaded_controller(5, 5);
        t.sync(&c);
        assert_eq!(t.watched(), None);
        assert!(t.observer().observed.is_empty());
    }

    #[test]
    fn test_visible_last_item_requests_next_page_once() {
        let (mut t, seen) = trigger();
        let mut c = loaded_controller(10, 25);
        t.sync(&c);

        t.observer_mut().fire(9);
        assert_eq!(keys(&seen), vec![9]);
        let sighting = seen.lock().unwrap()[0];

        let req = t.handle_visible(sighting, &mut c).unwrap();
        assert_eq!(req.page, 2);
        // Loading: observation dropped
        assert_eq!(t.watched(), None);
        assert_eq!(t.observer().unsubscribed, vec![1]);

        // A duplicate notification does nothing
        assert!(t.handle_visible(sighting, &mut c).is_none());
        assert_eq!(c.page(), 2);
    }

    #[test]
    fn test_reattaches_to_new_last_item_after_append() {
        let (mut t, seen) = trigger();
        let mut c = loaded_controller(10, 25);
        t.sync(&c);

        t.observer_mut().fire(9);
        let sighting = seen.lock().unwrap()[0];
        let req = t.handle_visible(sighting, &mut c).unwrap();
        c.apply(&req, Ok(page(10, 10, 25)));
        t.sync(&c);

        assert_eq!(t.watched(), Some(19));
        assert_eq!(t.observer().observed, vec![9, 19]);
        assert_eq!(t.observer().active.len(), 1);
    }

    #[test]
    fn test_sighting_from_replaced_observation_is_ignored() {
        let (mut t, seen) = trigger();
        let mut c = loaded_controller(10, 25);
        t.sync(&c);
        t.observer_mut().fire(9);
        let old = seen.lock().unwrap()[0];

        // New query, same row count: row 9 is watched again, by a new observation
        let req = c.submit_search("other").unwrap();
        t.sync(&c);
        c.apply(&req, Ok(page(100, 10, 25)));
        t.sync(&c);
        assert_eq!(t.watched(), Some(9));

        assert!(t.handle_visible(old, &mut c).is_none());
        assert_eq!(c.page(), 1);
        assert_eq!(t.watched(), Some(9));
    }

    #[test]
    fn test_repeated_repository_does_not_stand_in_for_last_row() {
        use crate::github::fixtures::repos;
        use crate::github::SearchPage;
        use crate::view::Viewport;

        // Row 9 repeats the repository shown in row 0
        let mut items = repos(0, 9);
        items.push(items[0].clone());
        let mut c = SearchController::new();
        let req = c.submit_search("test").unwrap();
        c.apply(
            &req,
            Ok(SearchPage {
                total_count: 25,
                items,
                total_available: 25,
            }),
        );

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut t = ScrollTrigger::new(Viewport::new(4), move |s| sink.lock().unwrap().push(s));
        t.observer_mut().set_rows((0..10).collect());
        t.sync(&c);

        // Row 0 is on screen, row 9 is not
        assert!(seen.lock().unwrap().is_empty());

        t.observer_mut().scroll_to_end();
        assert_eq!(keys(&seen), vec![9]);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let unsubscribed = Arc::new(Mutex::new(0));

        struct CountingObserver(Arc<Mutex<usize>>);
        impl VisibilityObserver for CountingObserver {
            type Subscription = u8;
            fn observe(&mut self, _: ItemKey, _: OnVisible) -> u8 {
                0
            }
            fn unsubscribe(&mut self, _: u8) {
                *self.0.lock().unwrap() += 1;
            }
        }

        let c = loaded_controller(10, 25);
        {
            let mut t = ScrollTrigger::new(CountingObserver(Arc::clone(&unsubscribed)), |_| {});
            t.sync(&c);
        }
        assert_eq!(*unsubscribed.lock().unwrap(), 1);
    }
}
