// src/view/viewport.rs
// =============================================================================
// A scrollable window over the rendered result rows.
//
// The terminal has no intersection observer, so this is ours: the viewport
// knows the rendered rows, how many fit on screen and where the screen
// starts. Anyone can ask it to report when a given row scrolls into view.
//
//   rows:    [r0 r1 r2 r3 r4 r5 r6 r7 r8 r9]
//   offset:            ^
//   height:  4         [r3 r4 r5 r6]          <- visible window
//
// Each subscription fires at most once: the first time its row is inside the
// window. That includes the moment of observe() itself if the row is already
// on screen.
// =============================================================================

use std::ops::Range;

use super::trigger::{ItemKey, OnVisible, VisibilityObserver};

/// Handle for one viewport observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportSubscription(u64);

struct RowWatch {
    id: u64,
    target: ItemKey,
    on_visible: OnVisible,
    fired: bool,
}

pub struct Viewport {
    height: usize,
    offset: usize,
    rows: Vec<ItemKey>,
    watches: Vec<RowWatch>,
    next_id: u64,
}

impl Viewport {
    /// Creates an empty viewport showing `height` rows (at least one).
    pub fn new(height: usize) -> Self {
        Self {
            height: height.max(1),
            offset: 0,
            rows: Vec::new(),
            watches: Vec::new(),
            next_id: 0,
        }
    }

    /// Replaces the rendered rows, keeping the scroll position where possible.
    pub fn set_rows(&mut self, rows: Vec<ItemKey>) {
        self.rows = rows;
        self.offset = self.offset.min(self.max_offset());
        self.check_intersections();
    }

    /// Scrolls by `delta` rows (negative scrolls up), clamped to the list.
    pub fn scroll_by(&mut self, delta: isize) {
        let target = if delta < 0 {
            self.offset.saturating_sub(delta.unsigned_abs())
        } else {
            self.offset.saturating_add(delta.unsigned_abs())
        };
        self.offset = target.min(self.max_offset());
        self.check_intersections();
    }

    /// Scrolls down one full screen
    pub fn page_down(&mut self) {
        self.scroll_by(isize::try_from(self.height).unwrap_or(isize::MAX));
    }

    pub fn scroll_to_top(&mut self) {
        self.offset = 0;
        self.check_intersections();
    }

    pub fn scroll_to_end(&mut self) {
        self.offset = self.max_offset();
        self.check_intersections();
    }

    /// Indices of the rows currently on screen
    pub fn visible_range(&self) -> Range<usize> {
        let end = (self.offset + self.height).min(self.rows.len());
        self.offset.min(end)..end
    }

    #[cfg(test)]
    pub fn is_visible(&self, key: ItemKey) -> bool {
        self.rows[self.visible_range()].contains(&key)
    }

    /// True when the bottom row is on screen (or there are no rows)
    #[cfg(test)]
    pub fn at_end(&self) -> bool {
        self.visible_range().end == self.rows.len()
    }

    #[cfg(test)]
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of live subscriptions
    #[cfg(test)]
    pub fn observing(&self) -> usize {
        self.watches.len()
    }

    fn max_offset(&self) -> usize {
        self.rows.len().saturating_sub(self.height)
    }

    // Fires every not-yet-fired watch whose row is on screen
    fn check_intersections(&mut self) {
        let visible = &self.rows[self.visible_range()];
        for watch in self.watches.iter_mut() {
            if !watch.fired && visible.contains(&watch.target) {
                watch.fired = true;
                (watch.on_visible)(watch.target);
            }
        }
    }
}

impl VisibilityObserver for Viewport {
    type Subscription = ViewportSubscription;

    fn observe(&mut self, target: ItemKey, on_visible: OnVisible) -> ViewportSubscription {
        self.next_id += 1;
        let id = self.next_id;
        self.watches.push(RowWatch {
            id,
            target,
            on_visible,
            fired: false,
        });
        self.check_intersections();
        ViewportSubscription(id)
    }

    fn unsubscribe(&mut self, subscription: ViewportSubscription) {
        self.watches.retain(|w| w.id != subscription.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<ItemKey>>>, impl Fn() -> OnVisible) {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&fired);
        let make = move || -> OnVisible {
            let sink = Arc::clone(&sink);
            Box::new(move |key| sink.lock().unwrap().push(key))
        };
        (fired, make)
    }

    fn keys(n: usize) -> Vec<ItemKey> {
        (0..n).collect()
    }

    #[test]
    fn test_visible_range_and_clamping() {
        let mut v = Viewport::new(4);
        v.set_rows(keys(10));
        assert_eq!(v.visible_range(), 0..4);

        v.scroll_by(3);
        assert_eq!(v.visible_range(), 3..7);

        v.scroll_by(100);
        assert_eq!(v.visible_range(), 6..10);
        assert!(v.at_end());

        v.scroll_by(-100);
        assert_eq!(v.offset(), 0);
    }

    #[test]
    fn test_short_list_fits_on_screen() {
        let mut v = Viewport::new(8);
        v.set_rows(keys(3));
        assert_eq!(v.visible_range(), 0..3);
        assert!(v.at_end());

        v.scroll_by(5);
        assert_eq!(v.offset(), 0);
    }

    #[test]
    fn test_fires_when_target_scrolls_into_view() {
        let (fired, make) = recorder();
        let mut v = Viewport::new(4);
        v.set_rows(keys(10));

        v.observe(9, make());
        assert!(fired.lock().unwrap().is_empty());

        v.scroll_by(4);
        assert!(fired.lock().unwrap().is_empty());

        v.page_down();
        assert_eq!(*fired.lock().unwrap(), vec![9]);
    }

    #[test]
    fn test_fires_immediately_when_already_visible() {
        let (fired, make) = recorder();
        let mut v = Viewport::new(10);
        v.set_rows(keys(5));

        v.observe(4, make());
        assert_eq!(*fired.lock().unwrap(), vec![4]);
    }

    #[test]
    fn test_fires_at_most_once() {
        let (fired, make) = recorder();
        let mut v = Viewport::new(2);
        v.set_rows(keys(6));
        v.observe(5, make());

        v.scroll_to_end();
        v.scroll_to_top();
        v.scroll_to_end();
        assert_eq!(*fired.lock().unwrap(), vec![5]);
    }

    #[test]
    fn test_unsubscribed_watch_never_fires() {
        let (fired, make) = recorder();
        let mut v = Viewport::new(2);
        v.set_rows(keys(6));

        let sub = v.observe(5, make());
        v.unsubscribe(sub);
        assert_eq!(v.observing(), 0);

        v.scroll_to_end();
        assert!(fired.lock().unwrap().is_empty());
    }

    #[test]
    fn test_growing_rows_keep_offset() {
        let mut v = Viewport::new(3);
        v.set_rows(keys(5));
        v.scroll_to_end();
        assert_eq!(v.offset(), 2);

        v.set_rows(keys(10));
        assert_eq!(v.offset(), 2);
        assert!(v.is_visible(3));
        assert!(!v.is_visible(9));
    }
}
