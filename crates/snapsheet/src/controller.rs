#![forbid(unsafe_code)]

//! The sheet state machine.
//!
//! [`SheetController`] composes resolution, classification, scroll
//! arbitration, and the animation driver. The host feeds it layout passes,
//! gesture samples, and frame ticks, and reads back the live offset.
//!
//! # State Machine
//!
//! ```text
//!            Began                      Ended/Cancelled/Failed
//!   Idle ───────────▶ Tracking ────────────────────────────────▶ Settling
//!    ▲                   ▲                                          │
//!    │                   └──────────── Began (value kept) ──────────┤
//!    └───────────────────────── settle completes ───────────────────┘
//! ```
//!
//! `move_to` is accepted in any phase and goes straight to `Settling` (or
//! `Idle` when not animated).
//!
//! # Invariants
//!
//! 1. The current snap point changes only when a target is committed, never
//!    during a drag.
//! 2. While tracking, relayouts are held and applied after release.
//! 3. Overtravel past the outermost points pins the offset to the boundary;
//!    only `height_adjustment` reflects it, scaled by the rubber-band factor.
//! 4. A gesture beginning mid-settle starts from the settle's current
//!    value, not its target.
//! 5. `WillMove` is emitted before the settle it announces is committed,
//!    and never for the point the sheet already announced arriving at.
//!
//! # Failure Modes
//!
//! - Samples before the first layout are ignored.
//! - Geometry the host cannot report defers layout; the sheet keeps its
//!   last state.
//! - Non-finite release velocities settle to the nearest point with no seed.

use snapsheet_core::animation::Scrubbable;
use snapsheet_core::geometry::Vec2;
use snapsheet_core::gesture::{DragDeadzone, DragSample, GesturePhase};
use tracing::{debug, debug_span, trace};
use web_time::Duration;

use crate::animation_driver::{AnimationDriver, DriverTick};
use crate::config::SheetConfig;
use crate::error::SheetError;
use crate::event::{SampleOutcome, SheetEvent, SheetEvents, SheetObserver};
use crate::host::{ContentMode, LayoutHost};
use crate::position::{Classification, classify};
use crate::resolver::{ResolvedState, resolve_for_host};
use crate::scroll_arbiter::{Arbitration, DragDirection, ScrollArbiter, ScrollableHandle};
use crate::snap_point::{ResolvedSnapPoint, SnapPoint, SnapPointRange};

/// Interaction phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SheetPhase {
    /// At rest on a snap point (or not yet laid out).
    Idle,
    /// A drag owns the offset.
    Tracking,
    /// A settle animation owns the offset.
    Settling,
}

/// Point-in-time view of the controller, for host debugging and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SheetSnapshot {
    pub phase: SheetPhase,
    pub offset: f64,
    pub height_adjustment: f64,
    pub visible_height: f64,
    pub current: Option<ResolvedSnapPoint>,
    pub interacting: bool,
    pub scrollable_locked: bool,
}

/// Interactive snap-point engine for one sheet.
pub struct SheetController {
    config: SheetConfig,
    resolved: Option<ResolvedState>,
    pending_layout: Option<ResolvedState>,
    phase: SheetPhase,
    offset: f64,
    raw_offset: f64,
    height_adjustment: f64,
    current: Option<ResolvedSnapPoint>,
    classification: Option<Classification>,
    interacting: bool,
    deadzone: DragDeadzone,
    arbiter: ScrollArbiter,
    driver: AnimationDriver,
    events: SheetEvents,
}

impl std::fmt::Debug for SheetController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetController")
            .field("phase", &self.phase)
            .field("offset", &self.offset)
            .field("height_adjustment", &self.height_adjustment)
            .field("current", &self.current)
            .field("resolved", &self.resolved)
            .field("pending_layout", &self.pending_layout.is_some())
            .field("arbiter", &self.arbiter)
            .field("driver", &self.driver)
            .field("events", &self.events)
            .finish()
    }
}

impl SheetController {
    /// Create a controller. The sheet does nothing until the first
    /// successful [`update_layout`](Self::update_layout).
    pub fn new(config: SheetConfig) -> Result<Self, SheetError> {
        config.validate()?;
        Ok(Self {
            deadzone: DragDeadzone::new(config.drag_threshold),
            driver: AnimationDriver::new(config.tuning()),
            config,
            resolved: None,
            pending_layout: None,
            phase: SheetPhase::Idle,
            offset: 0.0,
            raw_offset: 0.0,
            height_adjustment: 0.0,
            current: None,
            classification: None,
            interacting: false,
            arbiter: ScrollArbiter::new(),
            events: SheetEvents::default(),
        })
    }

    /// Deliver events to `observer` as they happen (builder pattern).
    #[must_use]
    pub fn with_observer(mut self, observer: impl FnMut(&SheetEvent) + 'static) -> Self {
        self.set_observer(Box::new(observer));
        self
    }

    /// Replace the event observer.
    pub fn set_observer(&mut self, observer: SheetObserver) {
        self.events.set_observer(observer);
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    #[inline]
    #[must_use]
    pub fn config(&self) -> &SheetConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn phase(&self) -> SheetPhase {
        self.phase
    }

    /// Live offset for the host to apply.
    #[inline]
    #[must_use]
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Rubber-band height correction: positive when over-expanded,
    /// negative when over-hidden.
    #[inline]
    #[must_use]
    pub fn height_adjustment(&self) -> f64 {
        self.height_adjustment
    }

    /// Height of the visible part of the sheet, for hosts that resize
    /// content to the visible area. Zero before the first layout.
    #[must_use]
    pub fn visible_height(&self) -> f64 {
        self.resolved.as_ref().map_or(0.0, |state| {
            state.max_expansion_height() - self.offset + self.height_adjustment
        })
    }

    /// The committed snap point.
    #[inline]
    #[must_use]
    pub fn current_snap_point(&self) -> Option<ResolvedSnapPoint> {
        self.current
    }

    #[inline]
    #[must_use]
    pub fn resolved(&self) -> Option<&ResolvedState> {
        self.resolved.as_ref()
    }

    /// Whether a drag or the settle following it is in progress.
    #[inline]
    #[must_use]
    pub fn is_interacting(&self) -> bool {
        self.interacting
    }

    #[inline]
    #[must_use]
    pub fn content_mode(&self) -> ContentMode {
        self.config.content_mode
    }

    /// Switch content mode; affects the next settle.
    pub fn set_content_mode(&mut self, mode: ContentMode) {
        self.config.content_mode = mode;
    }

    #[inline]
    #[must_use]
    pub fn driver(&self) -> &AnimationDriver {
        &self.driver
    }

    #[inline]
    #[must_use]
    pub fn arbiter(&self) -> &ScrollArbiter {
        &self.arbiter
    }

    /// Point-in-time view of the controller.
    #[must_use]
    pub fn snapshot(&self) -> SheetSnapshot {
        SheetSnapshot {
            phase: self.phase,
            offset: self.offset,
            height_adjustment: self.height_adjustment,
            visible_height: self.visible_height(),
            current: self.current,
            interacting: self.interacting,
            scrollable_locked: self.arbiter.is_locked(),
        }
    }

    /// Take queued events.
    pub fn drain_events(&mut self) -> Vec<SheetEvent> {
        self.events.drain()
    }

    /// Number of queued events.
    #[must_use]
    pub fn pending_event_count(&self) -> usize {
        self.events.pending()
    }

    // -----------------------------------------------------------------------
    // Layout
    // -----------------------------------------------------------------------

    /// Re-resolve snap points against the host's current geometry.
    ///
    /// Deferred while tracking or while the host cannot report a size.
    pub fn update_layout(&mut self, host: &dyn LayoutHost) -> Result<(), SheetError> {
        let Some(state) = resolve_for_host(&self.config.snap_points, host)? else {
            debug!(target: "snapsheet.layout", "geometry unavailable, layout deferred");
            return Ok(());
        };
        if self.phase == SheetPhase::Tracking {
            debug!(
                target: "snapsheet.layout",
                max_expansion_height = state.max_expansion_height(),
                "relayout held until release"
            );
            self.pending_layout = Some(state);
            return Ok(());
        }
        self.apply_layout(state);
        Ok(())
    }

    fn apply_layout(&mut self, state: ResolvedState) {
        if self.resolved.as_ref() == Some(&state) {
            return;
        }
        self.driver.rekey(&state);

        let Some(current) = self.current else {
            let initial = self
                .config
                .initial
                .and_then(|p| state.find(p))
                .or_else(|| self.config.snap_points.first().and_then(|p| state.find(*p)))
                .unwrap_or_else(|| state.topmost());
            debug!(
                target: "snapsheet.layout",
                offset = initial.offset,
                source = %initial.source,
                "initial layout"
            );
            self.offset = initial.offset;
            self.raw_offset = initial.offset;
            self.current = Some(initial);
            self.driver.mark_propagated(initial);
            self.driver.scrub(initial.offset);
            self.resolved = Some(state);
            return;
        };

        let fallback = state.topmost();
        let moved = state.find(current.source);
        self.resolved = Some(state);

        match moved {
            Some(point) => {
                self.current = Some(point);
                if self.phase == SheetPhase::Settling || point.offset != self.offset {
                    debug!(
                        target: "snapsheet.layout",
                        from = current.offset,
                        to = point.offset,
                        source = %point.source,
                        "relayout moved active snap point"
                    );
                    self.driver
                        .retarget_silently(self.offset, point, self.config.content_mode);
                    self.phase = SheetPhase::Settling;
                }
            }
            None => {
                debug!(
                    target: "snapsheet.layout",
                    lost = %current.source,
                    fallback = %fallback.source,
                    "active snap point no longer resolves"
                );
                self.commit_to(fallback, 0.0);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Gestures
    // -----------------------------------------------------------------------

    /// Feed one gesture sample. `scrollable` is read only with `Began`.
    pub fn handle_gesture(
        &mut self,
        sample: &DragSample,
        scrollable: Option<ScrollableHandle>,
    ) -> SampleOutcome {
        if self.resolved.is_none() {
            return SampleOutcome::Ignored;
        }
        match sample.phase {
            GesturePhase::Began => {
                self.begin(sample, scrollable);
                SampleOutcome::Ignored
            }
            GesturePhase::Changed => self.track(sample),
            GesturePhase::Ended | GesturePhase::Cancelled | GesturePhase::Failed => {
                if self.phase != SheetPhase::Tracking {
                    return SampleOutcome::Ignored;
                }
                self.release(sample.velocity);
                SampleOutcome::Released
            }
        }
    }

    fn begin(&mut self, sample: &DragSample, scrollable: Option<ScrollableHandle>) {
        if self.phase == SheetPhase::Tracking {
            self.arbiter.end();
        }
        if let Some(value) = self.driver.interrupt() {
            self.offset = value;
        }
        self.raw_offset = self.offset;
        self.height_adjustment = 0.0;
        self.phase = SheetPhase::Tracking;
        self.interacting = true;
        self.deadzone = DragDeadzone::new(self.config.drag_threshold);
        self.deadzone.begin(sample.location);

        let at_topmost = self.is_at_topmost();
        self.classification = self.resolved.as_ref().map(|s| classify(self.offset, s.points()));
        if let Some(scrollable) = scrollable {
            self.arbiter.begin(scrollable, at_topmost);
        }
        debug!(
            target: "snapsheet.drag",
            offset = self.offset,
            on_scrollable = self.arbiter.is_active(),
            "drag began"
        );
    }

    fn is_at_topmost(&self) -> bool {
        self.resolved
            .as_ref()
            .is_some_and(|s| self.offset.round() == s.topmost().offset)
    }

    fn track(&mut self, sample: &DragSample) -> SampleOutcome {
        if self.phase != SheetPhase::Tracking || !self.deadzone.admit(sample.translation) {
            return SampleOutcome::Ignored;
        }
        let dy = sample.translation.y;
        let Some(direction) = DragDirection::of(dy) else {
            return SampleOutcome::Ignored;
        };

        let at_topmost = self.is_at_topmost();
        if self.arbiter.arbitrate(direction, at_topmost) == Arbitration::ScrollableMoves {
            let held = self
                .classification
                .map_or(self.offset, |c| c.nearest(self.offset).offset);
            trace!(target: "snapsheet.drag", dy, held, "sheet vetoed, scrollable moves");
            self.offset = held;
            self.raw_offset = held;
            self.height_adjustment = 0.0;
            self.driver.scrub(held);
            self.classification = self.resolved.as_ref().map(|s| classify(held, s.points()));
            return SampleOutcome::ScrollableMoved;
        }

        let Some(state) = self.resolved.as_ref() else {
            return SampleOutcome::Ignored;
        };
        self.raw_offset += dy;
        let classification = classify(self.raw_offset, state.points());
        match classification {
            Classification::Exact(_) | Classification::Between(_) => {
                self.offset = self.raw_offset;
                self.height_adjustment = 0.0;
            }
            Classification::OutsideStart(bound) | Classification::OutsideEnd(bound) => {
                let overtravel = self.raw_offset - bound.offset;
                self.offset = bound.offset;
                self.height_adjustment = -self.config.rubber_band_factor * overtravel;
            }
        }
        self.driver.scrub(self.offset);
        self.classification = Some(classification);
        trace!(
            target: "snapsheet.drag",
            dy,
            offset = self.offset,
            height_adjustment = self.height_adjustment,
            ?classification,
            "sheet moved"
        );
        SampleOutcome::SheetMoved
    }

    /// Choose the release target from the classification and velocity.
    fn select_target(&self, classification: Classification, velocity: Vec2) -> ResolvedSnapPoint {
        let offset = self.offset;
        match classification {
            Classification::Between(range) => {
                let vy = velocity.y;
                let threshold = self.config.velocity_threshold;
                if velocity.is_mostly_horizontal() || !vy.is_finite() || vy.abs() <= threshold {
                    classification.nearest(offset)
                } else if vy > 0.0 {
                    range.end
                } else {
                    range.start
                }
            }
            Classification::Exact(p)
            | Classification::OutsideStart(p)
            | Classification::OutsideEnd(p) => p,
        }
    }

    /// Normalized seed velocity toward `target`, signed by the release
    /// direction.
    fn seed_velocity(&self, classification: Classification, target: f64, vy: f64) -> f64 {
        if classification.is_outside() {
            return 0.0;
        }
        let ratio = vy.abs() / (target - self.offset).abs();
        if ratio.is_finite() {
            ratio.min(self.config.max_seed_velocity).copysign(vy)
        } else {
            0.0
        }
    }

    fn release(&mut self, velocity: Vec2) {
        self.arbiter.end();
        self.deadzone.end();

        let Some(state) = self.resolved.as_ref() else {
            return;
        };
        let classification = self
            .classification
            .unwrap_or_else(|| classify(self.offset, state.points()));

        let span = debug_span!(
            target: "snapsheet.drag",
            "sheet.settle",
            release_offset = self.offset,
            velocity_y = velocity.y,
            target_offset = tracing::field::Empty
        );
        let _guard = span.enter();

        let target = self.select_target(classification, velocity);
        span.record("target_offset", target.offset);
        let seed = self.seed_velocity(classification, target.offset, velocity.y);
        debug!(
            target: "snapsheet.drag",
            ?classification,
            seed,
            source = %target.source,
            "drag released"
        );

        self.height_adjustment = 0.0;
        self.raw_offset = self.offset;
        self.classification = None;
        self.commit_to(target, seed);
        self.apply_pending_layout();
    }

    fn commit_to(&mut self, target: ResolvedSnapPoint, seed: f64) {
        self.announce(target);
        self.driver
            .commit(self.offset, target, seed, self.config.content_mode);
        self.current = Some(target);
        self.phase = SheetPhase::Settling;
    }

    /// Emit `WillMove` unless `target` is the point the sheet already
    /// announced arriving at. Returning there completes without a
    /// `DidMove`, so a `WillMove` would be left unanswered.
    fn announce(&mut self, target: ResolvedSnapPoint) {
        if self.driver.last_propagated() == Some(target) {
            trace!(
                target: "snapsheet.drag",
                source = %target.source,
                "returning to announced point"
            );
            return;
        }
        self.events.emit(SheetEvent::WillMove(target.source));
    }

    fn apply_pending_layout(&mut self) {
        if let Some(state) = self.pending_layout.take() {
            debug!(target: "snapsheet.layout", "applying held relayout");
            self.apply_layout(state);
        }
    }

    /// The host reports that the embedded scrollable's offset changed.
    pub fn on_scrollable_scrolled(&mut self) {
        self.arbiter.on_scrollable_scrolled();
    }

    // -----------------------------------------------------------------------
    // Programmatic control
    // -----------------------------------------------------------------------

    /// Move to `point`, interrupting any drag or settle.
    pub fn move_to(&mut self, point: SnapPoint, animated: bool) -> Result<(), SheetError> {
        let state = self.resolved.as_ref().ok_or(SheetError::NotLaidOut)?;
        let target = state.find(point).ok_or(SheetError::UnknownSnapPoint(point))?;

        if self.phase == SheetPhase::Tracking {
            self.arbiter.end();
            self.deadzone.end();
        }
        self.height_adjustment = 0.0;
        self.classification = None;
        debug!(
            target: "snapsheet.drag",
            to = target.offset,
            source = %target.source,
            animated,
            "programmatic move"
        );

        if animated {
            self.commit_to(target, 0.0);
        } else {
            self.announce(target);
            let announce = self.driver.jump(target);
            self.offset = target.offset;
            self.raw_offset = target.offset;
            self.current = Some(target);
            self.phase = SheetPhase::Idle;
            self.interacting = false;
            if let Some(point) = announce {
                self.events.emit(SheetEvent::DidMove(point.source));
            }
        }
        self.apply_pending_layout();
        Ok(())
    }

    /// Register an auxiliary animation that plays while the sheet crosses
    /// between `from` and `to`. The animation is scrubbed to the current
    /// offset immediately.
    pub fn register_auxiliary(
        &mut self,
        from: SnapPoint,
        to: SnapPoint,
        animation: impl Scrubbable + 'static,
    ) -> Result<SnapPointRange, SheetError> {
        let state = self.resolved.as_ref().ok_or(SheetError::NotLaidOut)?;
        let a = state.find(from).ok_or(SheetError::UnknownSnapPoint(from))?;
        let b = state.find(to).ok_or(SheetError::UnknownSnapPoint(to))?;
        let range = SnapPointRange::new(a, b).ok_or(SheetError::DegenerateRange(from, to))?;
        self.driver
            .register_auxiliary(range, Box::new(animation), Some(self.offset));
        Ok(range)
    }

    // -----------------------------------------------------------------------
    // Frame clock
    // -----------------------------------------------------------------------

    /// Advance by one frame. Deferred work runs first, then animations.
    ///
    /// Returns `true` while anything is still animating.
    pub fn tick(&mut self, dt: Duration) -> bool {
        self.arbiter.run_deferred();

        match self.driver.tick(dt) {
            DriverTick::Idle => {}
            DriverTick::Moved(value) => {
                self.offset = value;
                self.raw_offset = value;
            }
            DriverTick::Settled { target, did_move } => {
                self.offset = target.offset;
                self.raw_offset = target.offset;
                if self.phase == SheetPhase::Settling {
                    self.phase = SheetPhase::Idle;
                    self.interacting = false;
                }
                if let Some(point) = did_move {
                    self.events.emit(SheetEvent::DidMove(point.source));
                }
            }
        }
        self.driver.is_settling() || self.driver.auxiliary_running()
    }
}
