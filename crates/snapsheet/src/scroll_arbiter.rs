#![forbid(unsafe_code)]

//! Arbitration between the sheet and an embedded scrollable region.
//!
//! When a drag starts on top of scrollable content, both the sheet and the
//! content want the same finger travel. The arbiter decides per sample
//! which one receives it and pins the other.
//!
//! # Decision table
//!
//! Dragging toward hidden (finger down):
//!
//! | Ever reached topmost ∧ began scrolled away | Scrollable at top | Result |
//! |---|---|---|
//! | yes | any | unlock, scrollable moves |
//! | no | yes | lock at top of content, hide indicator, sheet moves |
//! | no | no | unlock, scrollable moves |
//!
//! Dragging toward expanded (finger up): if the sheet is at its topmost
//! point the scrollable is unlocked and moves; otherwise it is locked where
//! it is and the sheet moves.
//!
//! # Invariants
//!
//! 1. While locked, the scrollable's offset is re-pinned on every sample and
//!    on every scroll notification.
//! 2. Ending a session always unlocks and restores the indicator.
//! 3. A restore after perturbation is deferred to [`ScrollArbiter::run_deferred`],
//!    never applied synchronously from `end`. Only a session that ends
//!    while locked can queue one.
//!
//! # Failure Modes
//!
//! - A new session discards a deferred restore that has not run yet; the
//!   new gesture owns the scrollable from then on.

use std::cell::RefCell;
use std::rc::Rc;

use snapsheet_core::geometry::{Point, Vec2};
use tracing::trace;

/// Read/write access to a scrollable content region.
pub trait ScrollableRegion {
    /// Current content offset.
    fn offset(&self) -> Point;

    /// Move the content offset.
    fn set_offset(&mut self, offset: Point);

    /// Whether the content is scrolled to its top edge. With
    /// `including_overscroll`, a bounce past the top also counts.
    fn is_at_top(&self, including_overscroll: bool) -> bool;

    /// Inset above the first row of content.
    fn top_inset(&self) -> f64 {
        0.0
    }

    /// Whether the scroll indicator is visible.
    fn shows_indicator(&self) -> bool;

    /// Show or hide the scroll indicator.
    fn set_shows_indicator(&mut self, shows: bool);
}

/// Shared handle to a host scrollable, supplied with the `Began` sample.
pub type ScrollableHandle = Rc<RefCell<dyn ScrollableRegion>>;

/// An in-memory scrollable region for headless hosts and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualScrollable {
    pub offset: Point,
    pub top_inset: f64,
    pub shows_indicator: bool,
    /// Number of `set_offset` calls received.
    pub writes: usize,
}

impl VirtualScrollable {
    /// A region resting at its top with the indicator visible.
    #[must_use]
    pub fn new() -> Self {
        Self {
            offset: Point::ZERO,
            top_inset: 0.0,
            shows_indicator: true,
            writes: 0,
        }
    }

    /// Start scrolled to `y` (builder pattern).
    #[must_use]
    pub fn scrolled_to(mut self, y: f64) -> Self {
        self.offset = Point::new(self.offset.x, y);
        self
    }

    /// Wrap in a shared handle.
    #[must_use]
    pub fn into_handle(self) -> Rc<RefCell<VirtualScrollable>> {
        Rc::new(RefCell::new(self))
    }

    /// Simulate the region's own scrolling (e.g. from deceleration).
    pub fn scroll_by(&mut self, dy: f64) {
        self.offset = self.offset.offset_by(Vec2::new(0.0, dy));
    }
}

impl Default for VirtualScrollable {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrollableRegion for VirtualScrollable {
    fn offset(&self) -> Point {
        self.offset
    }

    fn set_offset(&mut self, offset: Point) {
        self.offset = offset;
        self.writes += 1;
    }

    fn is_at_top(&self, including_overscroll: bool) -> bool {
        let top = -self.top_inset;
        if including_overscroll {
            self.offset.y <= top
        } else {
            self.offset.y == top
        }
    }

    fn top_inset(&self) -> f64 {
        self.top_inset
    }

    fn shows_indicator(&self) -> bool {
        self.shows_indicator
    }

    fn set_shows_indicator(&mut self, shows: bool) {
        self.shows_indicator = shows;
    }
}

// ---------------------------------------------------------------------------
// Arbiter
// ---------------------------------------------------------------------------

/// Direction of finger travel along the sheet's axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragDirection {
    /// Increasing offset (finger moving down).
    TowardHidden,
    /// Decreasing offset (finger moving up).
    TowardExpanded,
}

impl DragDirection {
    /// Direction of a vertical translation, or `None` for no travel.
    #[must_use]
    pub fn of(dy: f64) -> Option<Self> {
        if dy > 0.0 {
            Some(Self::TowardHidden)
        } else if dy < 0.0 {
            Some(Self::TowardExpanded)
        } else {
            None
        }
    }
}

/// Which side receives a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arbitration {
    /// The sheet moves; any scrollable is pinned.
    SheetMoves,
    /// The scrollable moves; the sheet is vetoed for this sample.
    ScrollableMoves,
}

struct Session {
    scrollable: ScrollableHandle,
    is_locked: bool,
    pinned: Point,
    last_observed_offset: Point,
    initial_shows_indicator: bool,
    initial_is_scrolling_away_from_top: bool,
    has_ever_reached_topmost: bool,
    perturbed: bool,
}

impl Session {
    fn lock(&mut self, pin: Option<Point>) {
        let mut region = self.scrollable.borrow_mut();
        let current = region.offset();
        let was_locked = self.is_locked;
        if !was_locked {
            self.last_observed_offset = current;
            self.is_locked = true;
            trace!(target: "snapsheet.arbiter", y = current.y, "scrollable locked");
        }
        self.pinned = pin.unwrap_or(if was_locked { self.pinned } else { current });
        if current != self.pinned {
            region.set_offset(self.pinned);
        }
    }

    fn unlock(&mut self) {
        if self.is_locked {
            self.is_locked = false;
            self.perturbed = false;
            trace!(target: "snapsheet.arbiter", "scrollable unlocked");
        }
        self.last_observed_offset = self.scrollable.borrow().offset();
    }
}

/// Per-gesture arbitration state plus at most one deferred restore.
#[derive(Default)]
pub struct ScrollArbiter {
    session: Option<Session>,
    pending_restore: Option<(ScrollableHandle, Point)>,
}

impl std::fmt::Debug for ScrollArbiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrollArbiter")
            .field("active", &self.session.is_some())
            .field("locked", &self.is_locked())
            .field("pending_restore", &self.pending_restore.as_ref().map(|(_, p)| *p))
            .finish()
    }
}

impl ScrollArbiter {
    /// An arbiter with no session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session for a gesture that landed on `scrollable`.
    pub fn begin(&mut self, scrollable: ScrollableHandle, sheet_at_topmost: bool) {
        self.pending_restore = None;
        let (offset, shows, away) = {
            let region = scrollable.borrow();
            (region.offset(), region.shows_indicator(), !region.is_at_top(false))
        };
        trace!(
            target: "snapsheet.arbiter",
            y = offset.y,
            scrolled_away = away,
            sheet_at_topmost,
            "arbitration session began"
        );
        self.session = Some(Session {
            scrollable,
            is_locked: false,
            pinned: offset,
            last_observed_offset: offset,
            initial_shows_indicator: shows,
            initial_is_scrolling_away_from_top: away,
            has_ever_reached_topmost: sheet_at_topmost,
            perturbed: false,
        });
    }

    /// Whether a session is live.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Whether the scrollable is currently pinned.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_locked)
    }

    /// Whether a restore is waiting for the next tick.
    #[inline]
    #[must_use]
    pub fn has_pending_restore(&self) -> bool {
        self.pending_restore.is_some()
    }

    /// Decide who receives a `Changed` sample. Without a session the sheet
    /// always moves.
    pub fn arbitrate(&mut self, direction: DragDirection, sheet_at_topmost: bool) -> Arbitration {
        let Some(session) = self.session.as_mut() else {
            return Arbitration::SheetMoves;
        };
        session.has_ever_reached_topmost |= sheet_at_topmost;

        let decision = match direction {
            DragDirection::TowardHidden => {
                if session.has_ever_reached_topmost && session.initial_is_scrolling_away_from_top {
                    session.unlock();
                    Arbitration::ScrollableMoves
                } else if session.scrollable.borrow().is_at_top(true) {
                    let top = {
                        let region = session.scrollable.borrow();
                        Point::new(region.offset().x, -region.top_inset())
                    };
                    session.lock(Some(top));
                    session.scrollable.borrow_mut().set_shows_indicator(false);
                    Arbitration::SheetMoves
                } else {
                    session.unlock();
                    Arbitration::ScrollableMoves
                }
            }
            DragDirection::TowardExpanded => {
                if sheet_at_topmost {
                    session.unlock();
                    Arbitration::ScrollableMoves
                } else {
                    session.lock(None);
                    Arbitration::SheetMoves
                }
            }
        };
        trace!(
            target: "snapsheet.arbiter",
            ?direction,
            ?decision,
            sheet_at_topmost,
            "arbitrated sample"
        );
        decision
    }

    /// The host reports that the scrollable's offset changed. A locked
    /// scrollable is pinned back and marked perturbed.
    pub fn on_scrollable_scrolled(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.is_locked {
            session.last_observed_offset = session.scrollable.borrow().offset();
            return;
        }
        let mut region = session.scrollable.borrow_mut();
        if region.offset() != session.pinned {
            session.perturbed = true;
            region.set_offset(session.pinned);
        }
    }

    /// End the session: unlock, restore the indicator, and queue a restore
    /// of the pre-lock offset if the scrollable was perturbed while locked.
    pub fn end(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        session
            .scrollable
            .borrow_mut()
            .set_shows_indicator(session.initial_shows_indicator);
        if session.perturbed {
            trace!(
                target: "snapsheet.arbiter",
                y = session.last_observed_offset.y,
                "queued scrollable restore"
            );
            self.pending_restore = Some((session.scrollable, session.last_observed_offset));
        }
    }

    /// Apply a queued restore. Called at the start of each frame tick.
    pub fn run_deferred(&mut self) {
        if let Some((scrollable, offset)) = self.pending_restore.take() {
            trace!(target: "snapsheet.arbiter", y = offset.y, "restored scrollable offset");
            scrollable.borrow_mut().set_offset(offset);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(
        scroll: VirtualScrollable,
        sheet_at_topmost: bool,
    ) -> (ScrollArbiter, Rc<RefCell<VirtualScrollable>>) {
        let handle = scroll.into_handle();
        let mut arbiter = ScrollArbiter::new();
        arbiter.begin(handle.clone(), sheet_at_topmost);
        (arbiter, handle)
    }

    #[test]
    fn no_session_always_moves_sheet() {
        let mut arbiter = ScrollArbiter::new();
        assert_eq!(
            arbiter.arbitrate(DragDirection::TowardHidden, true),
            Arbitration::SheetMoves
        );
        assert!(!arbiter.is_locked());
    }

    #[test]
    fn expanding_below_topmost_locks_scrollable() {
        let (mut arbiter, scroll) = session(VirtualScrollable::new(), false);
        assert_eq!(
            arbiter.arbitrate(DragDirection::TowardExpanded, false),
            Arbitration::SheetMoves
        );
        assert!(arbiter.is_locked());

        // Reaching topmost hands travel to the scrollable.
        assert_eq!(
            arbiter.arbitrate(DragDirection::TowardExpanded, true),
            Arbitration::ScrollableMoves
        );
        assert!(!arbiter.is_locked());
        assert_eq!(scroll.borrow().offset, Point::ZERO);
    }

    #[test]
    fn hiding_at_top_locks_to_top_and_hides_indicator() {
        let mut scroll = VirtualScrollable::new().scrolled_to(-6.0);
        scroll.top_inset = 0.0;
        let (mut arbiter, scroll) = session(scroll, false);
        assert_eq!(
            arbiter.arbitrate(DragDirection::TowardHidden, false),
            Arbitration::SheetMoves
        );
        let region = scroll.borrow();
        assert_eq!(region.offset.y, 0.0, "pinned to top of content");
        assert!(!region.shows_indicator);
    }

    #[test]
    fn hiding_while_scrolled_lets_scrollable_move() {
        let (mut arbiter, _scroll) = session(VirtualScrollable::new().scrolled_to(120.0), false);
        assert_eq!(
            arbiter.arbitrate(DragDirection::TowardHidden, false),
            Arbitration::ScrollableMoves
        );
        assert!(!arbiter.is_locked());
    }

    #[test]
    fn scrolled_away_at_topmost_keeps_scrolling_past_top() {
        let (mut arbiter, scroll) = session(VirtualScrollable::new().scrolled_to(40.0), true);
        // Content scrolls back to its top during the drag.
        scroll.borrow_mut().offset = Point::ZERO;
        assert_eq!(
            arbiter.arbitrate(DragDirection::TowardHidden, true),
            Arbitration::ScrollableMoves,
            "began scrolled away and sheet reached topmost"
        );
    }

    #[test]
    fn perturbation_while_locked_is_pinned_and_restored_later() {
        let (mut arbiter, scroll) = session(VirtualScrollable::new().scrolled_to(30.0), false);
        arbiter.arbitrate(DragDirection::TowardExpanded, false);

        scroll.borrow_mut().scroll_by(15.0);
        arbiter.on_scrollable_scrolled();
        assert_eq!(scroll.borrow().offset.y, 30.0, "pinned");

        arbiter.end();
        assert!(arbiter.has_pending_restore());
        scroll.borrow_mut().scroll_by(5.0);
        assert_eq!(scroll.borrow().offset.y, 35.0, "restore is not synchronous");

        arbiter.run_deferred();
        assert_eq!(scroll.borrow().offset.y, 30.0);
        assert!(!arbiter.has_pending_restore());
    }

    #[test]
    fn end_without_perturbation_queues_nothing() {
        let (mut arbiter, scroll) = session(VirtualScrollable::new(), false);
        arbiter.arbitrate(DragDirection::TowardHidden, false);
        assert!(!scroll.borrow().shows_indicator);
        arbiter.end();
        assert!(!arbiter.has_pending_restore());
        assert!(scroll.borrow().shows_indicator, "indicator restored");
        assert!(!arbiter.is_active());
    }

    #[test]
    fn new_session_discards_pending_restore() {
        let (mut arbiter, scroll) = session(VirtualScrollable::new().scrolled_to(10.0), false);
        arbiter.arbitrate(DragDirection::TowardExpanded, false);
        scroll.borrow_mut().scroll_by(3.0);
        arbiter.on_scrollable_scrolled();
        arbiter.end();
        assert!(arbiter.has_pending_restore());

        arbiter.begin(scroll.clone(), false);
        assert!(!arbiter.has_pending_restore());
    }

    #[test]
    fn direction_of_delta() {
        assert_eq!(DragDirection::of(3.0), Some(DragDirection::TowardHidden));
        assert_eq!(DragDirection::of(-3.0), Some(DragDirection::TowardExpanded));
        assert_eq!(DragDirection::of(0.0), None);
    }
}
