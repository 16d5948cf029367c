#![forbid(unsafe_code)]

//! Settle animation plus range-scoped auxiliary animations.
//!
//! The driver owns at most one primary [`Spring`] carrying the sheet offset
//! to a committed snap point, and a store of host-registered
//! [`Scrubbable`] animations keyed by [`SnapPointRange`].
//!
//! # Lifecycle
//!
//! ```text
//!   commit ──▶ primary Some(spring) ──tick…──▶ at rest ──▶ Settled
//!     ▲              │
//!     │          interrupt (drag begins) ──▶ None, value kept
//! ```
//!
//! # Invariants
//!
//! 1. "No animation in flight" is `primary == None`, never a stale spring.
//! 2. Stopping the primary keeps its current value; nothing jumps.
//! 3. A completion reports `did_move` only if its target differs from the
//!    last propagated target, so repeated commits of the same target
//!    coalesce into one notification.
//! 4. Scrubbing pauses every auxiliary animation it touches.
//!
//! # Failure Modes
//!
//! - An interrupted settle never completes; its notification is dropped.
//!   The next commit supersedes it.
//! - Non-finite seed velocities are treated as zero.

use ahash::AHashMap;
use snapsheet_core::animation::{Animation, Scrubbable, Spring, SpringProfile};
use tracing::debug;
use web_time::Duration;

use crate::host::ContentMode;
use crate::resolver::ResolvedState;
use crate::snap_point::{ResolvedSnapPoint, SnapPointRange};

/// How much a fling at the seed cap shortens the spring response.
const FLING_RESPONSE_REDUCTION: f64 = 0.35;

/// Spring tuning used for settle animations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettleTuning {
    /// Base profile while content resizes to the visible area.
    pub resize: SpringProfile,
    /// Base profile while only the offset moves.
    pub no_resize: SpringProfile,
    /// Cap on the normalized seed velocity.
    pub max_seed_velocity: f64,
}

impl Default for SettleTuning {
    fn default() -> Self {
        Self {
            resize: SpringProfile::new(0.75, 0.35),
            no_resize: SpringProfile::new(0.9, 0.4),
            max_seed_velocity: 20.0,
        }
    }
}

impl SettleTuning {
    /// Profile for a settle in `mode` seeded with normalized `seed` velocity.
    #[must_use]
    pub fn profile(&self, mode: ContentMode, seed: f64) -> SpringProfile {
        let base = match mode {
            ContentMode::ResizeToVisibleArea => self.resize,
            ContentMode::NoResize => self.no_resize,
        };
        let cap = self.max_seed_velocity;
        let speed = if cap > 0.0 && seed.is_finite() {
            (seed.abs() / cap).min(1.0)
        } else {
            0.0
        };
        base.scaled_response(1.0 - FLING_RESPONSE_REDUCTION * speed)
    }
}

/// Result of advancing the driver by one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriverTick {
    /// No settle in flight.
    Idle,
    /// The settle moved the offset.
    Moved(f64),
    /// The settle came to rest on its target this frame.
    Settled {
        target: ResolvedSnapPoint,
        /// The target to announce, if it was not already propagated.
        did_move: Option<ResolvedSnapPoint>,
    },
}

#[derive(Debug)]
struct Settle {
    spring: Spring,
    target: ResolvedSnapPoint,
}

/// Owner of the primary settle spring and the auxiliary animation store.
pub struct AnimationDriver {
    tuning: SettleTuning,
    primary: Option<Settle>,
    auxiliary: AHashMap<SnapPointRange, Vec<Box<dyn Scrubbable>>>,
    last_propagated: Option<ResolvedSnapPoint>,
}

impl std::fmt::Debug for AnimationDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationDriver")
            .field("tuning", &self.tuning)
            .field("primary", &self.primary)
            .field("auxiliary_ranges", &self.auxiliary.len())
            .field("last_propagated", &self.last_propagated)
            .finish()
    }
}

impl AnimationDriver {
    /// An idle driver.
    #[must_use]
    pub fn new(tuning: SettleTuning) -> Self {
        Self {
            tuning,
            primary: None,
            auxiliary: AHashMap::new(),
            last_propagated: None,
        }
    }

    /// Spring tuning in use.
    #[inline]
    #[must_use]
    pub fn tuning(&self) -> SettleTuning {
        self.tuning
    }

    /// Whether a settle is in flight.
    #[inline]
    #[must_use]
    pub fn is_settling(&self) -> bool {
        self.primary.is_some()
    }

    /// Current interpolated value of the settle, if any.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        self.primary.as_ref().map(|s| s.spring.position())
    }

    /// Target of the settle in flight, if any.
    #[must_use]
    pub fn target(&self) -> Option<ResolvedSnapPoint> {
        self.primary.as_ref().map(|s| s.target)
    }

    /// The most recently announced snap point.
    #[inline]
    #[must_use]
    pub fn last_propagated(&self) -> Option<ResolvedSnapPoint> {
        self.last_propagated
    }

    /// Record `point` as announced without animating (initial placement).
    pub fn mark_propagated(&mut self, point: ResolvedSnapPoint) {
        self.last_propagated = Some(point);
    }

    // -----------------------------------------------------------------------
    // Primary
    // -----------------------------------------------------------------------

    /// Stop the settle where it is. Returns the value it stopped at.
    ///
    /// Any pending completion is dropped.
    pub fn stop_keeping_value(&mut self) -> Option<f64> {
        let mut settle = self.primary.take()?;
        let value = settle.spring.stop();
        debug!(
            target: "snapsheet.animation",
            value,
            target_offset = settle.target.offset,
            "settle interrupted"
        );
        Some(value)
    }

    /// A drag took over: stop the settle and pause every auxiliary animation
    /// so the drag can scrub them. Returns the settle's current value.
    pub fn interrupt(&mut self) -> Option<f64> {
        for animation in self.auxiliary.values_mut().flatten() {
            animation.pause();
        }
        self.stop_keeping_value()
    }

    /// Start a settle from `from` toward `target`.
    ///
    /// `seed` is the normalized release velocity (`|v| / distance`, already
    /// capped), signed by the release direction. An in-flight settle is
    /// stopped first and its current value becomes the start position.
    pub fn commit(&mut self, from: f64, target: ResolvedSnapPoint, seed: f64, mode: ContentMode) {
        let from = self.stop_keeping_value().unwrap_or(from);
        let seed = if seed.is_finite() { seed } else { 0.0 };
        let distance = (target.offset - from).abs();
        let velocity = seed * distance;
        let profile = self.tuning.profile(mode, seed);

        debug!(
            target: "snapsheet.animation",
            from,
            to = target.offset,
            source = %target.source,
            seed,
            velocity,
            damping_ratio = profile.damping_ratio,
            response = profile.response,
            coalesced = self.last_propagated == Some(target),
            "settle committed"
        );

        self.primary = Some(Settle {
            spring: Spring::new(from, target.offset)
                .with_profile(profile)
                .with_velocity(velocity),
            target,
        });
        self.release_auxiliary(target.offset);
    }

    /// Move the settle (or a resting sheet at `from`) to `target` without
    /// announcing it. Used when relayout shifts the active snap point.
    pub fn retarget_silently(&mut self, from: f64, target: ResolvedSnapPoint, mode: ContentMode) {
        if self
            .last_propagated
            .is_some_and(|last| last.source == target.source)
        {
            self.last_propagated = Some(target);
        }
        match self.primary.as_mut() {
            Some(settle) => {
                settle.spring.retarget(target.offset);
                settle.target = target;
            }
            None => {
                self.primary = Some(Settle {
                    spring: Spring::new(from, target.offset)
                        .with_profile(self.tuning.profile(mode, 0.0)),
                    target,
                });
            }
        }
        debug!(
            target: "snapsheet.animation",
            to = target.offset,
            source = %target.source,
            "settle retargeted"
        );
        self.release_auxiliary(target.offset);
    }

    /// Place the sheet at `target` immediately. Returns the point to
    /// announce, if it was not already propagated.
    pub fn jump(&mut self, target: ResolvedSnapPoint) -> Option<ResolvedSnapPoint> {
        self.stop_keeping_value();
        for (range, animations) in &mut self.auxiliary {
            let fraction = range.visible_progress(target.offset);
            for animation in animations.iter_mut() {
                animation.set_fraction_complete(fraction);
            }
        }
        self.propagate(target)
    }

    fn propagate(&mut self, target: ResolvedSnapPoint) -> Option<ResolvedSnapPoint> {
        if self.last_propagated == Some(target) {
            debug!(
                target: "snapsheet.animation",
                offset = target.offset,
                "duplicate completion suppressed"
            );
            return None;
        }
        self.last_propagated = Some(target);
        Some(target)
    }

    /// Advance the settle and any running auxiliary animations by `dt`.
    pub fn tick(&mut self, dt: Duration) -> DriverTick {
        for animation in self.auxiliary.values_mut().flatten() {
            if animation.is_running() {
                animation.tick(dt);
            }
        }

        let Some(settle) = self.primary.as_mut() else {
            return DriverTick::Idle;
        };
        settle.spring.advance(dt);
        if !settle.spring.is_at_rest() {
            return DriverTick::Moved(settle.spring.position());
        }

        let target = settle.target;
        self.primary = None;
        let did_move = self.propagate(target);
        debug!(
            target: "snapsheet.animation",
            offset = target.offset,
            source = %target.source,
            announced = did_move.is_some(),
            "settle complete"
        );
        DriverTick::Settled { target, did_move }
    }

    // -----------------------------------------------------------------------
    // Auxiliary
    // -----------------------------------------------------------------------

    /// Register an auxiliary animation for `range`. Duplicates are kept.
    ///
    /// When `at` is given the animation is scrubbed to that offset first.
    pub fn register_auxiliary(
        &mut self,
        range: SnapPointRange,
        mut animation: Box<dyn Scrubbable>,
        at: Option<f64>,
    ) {
        if let Some(offset) = at {
            animation.set_fraction_complete(range.visible_progress(offset));
        }
        self.auxiliary.entry(range).or_default().push(animation);
    }

    /// Number of auxiliary animations registered across all ranges.
    #[must_use]
    pub fn auxiliary_count(&self) -> usize {
        self.auxiliary.values().map(Vec::len).sum()
    }

    /// Fractions of the animations registered for `range`.
    #[must_use]
    pub fn auxiliary_fractions(&self, range: &SnapPointRange) -> Vec<f64> {
        self.auxiliary
            .get(range)
            .map(|animations| animations.iter().map(|a| a.fraction_complete()).collect())
            .unwrap_or_default()
    }

    /// Whether any auxiliary animation is running on its own clock.
    #[must_use]
    pub fn auxiliary_running(&self) -> bool {
        self.auxiliary.values().flatten().any(|a| a.is_running())
    }

    /// Drive every auxiliary animation from the drag offset: ranges on the
    /// more visible side read 1, ranges on the more hidden side read 0, and
    /// the range containing `offset` reads its reversed progress.
    pub fn scrub(&mut self, offset: f64) {
        for (range, animations) in &mut self.auxiliary {
            let fraction = range.visible_progress(offset);
            for animation in animations.iter_mut() {
                animation.set_fraction_complete(fraction);
            }
        }
    }

    /// Let every auxiliary animation finish toward its value at `target`.
    fn release_auxiliary(&mut self, target: f64) {
        for (range, animations) in &mut self.auxiliary {
            let goal = range.visible_progress(target);
            for animation in animations.iter_mut() {
                let current = animation.fraction_complete();
                if (goal - current).abs() <= f64::EPSILON {
                    continue;
                }
                if goal >= 1.0 {
                    animation.resume(false);
                } else if goal <= 0.0 {
                    animation.resume(true);
                } else {
                    animation.set_fraction_complete(goal);
                }
            }
        }
    }

    /// Move auxiliary animations to the ranges their sources resolve to in
    /// `state`. Ranges with a vanished source are dropped.
    ///
    /// The last propagated point follows its source too, so a relayout
    /// never makes a resting point look new.
    pub fn rekey(&mut self, state: &ResolvedState) {
        if let Some(last) = self.last_propagated
            && let Some(moved) = state.find(last.source)
        {
            self.last_propagated = Some(moved);
        }
        let old = std::mem::take(&mut self.auxiliary);
        for (range, animations) in old {
            let rekeyed = state
                .find(range.start.source)
                .zip(state.find(range.end.source))
                .and_then(|(a, b)| SnapPointRange::new(a, b));
            match rekeyed {
                Some(new_range) => self.auxiliary.entry(new_range).or_default().extend(animations),
                None => debug!(
                    target: "snapsheet.layout",
                    range = %range,
                    dropped = animations.len(),
                    "auxiliary range no longer resolves"
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snap_point::SnapPoint;
    use snapsheet_core::animation::ScrubAnimation;
    use std::cell::Cell;
    use std::rc::Rc;

    const MS_16: Duration = Duration::from_millis(16);

    fn half() -> ResolvedSnapPoint {
        ResolvedSnapPoint::new(300.0, SnapPoint::HALF)
    }

    fn hidden() -> ResolvedSnapPoint {
        ResolvedSnapPoint::new(600.0, SnapPoint::HIDDEN)
    }

    fn full() -> ResolvedSnapPoint {
        ResolvedSnapPoint::new(0.0, SnapPoint::FULL)
    }

    fn settle(driver: &mut AnimationDriver) -> Vec<DriverTick> {
        let mut ticks = Vec::new();
        for _ in 0..2_000 {
            let tick = driver.tick(MS_16);
            ticks.push(tick);
            if !matches!(tick, DriverTick::Moved(_)) {
                break;
            }
        }
        ticks
    }

    fn scrub_anim() -> Box<dyn Scrubbable> {
        Box::new(ScrubAnimation::new(Duration::from_millis(200)))
    }

    #[test]
    fn commit_settles_on_target_and_announces_once() {
        let mut driver = AnimationDriver::new(SettleTuning::default());
        driver.commit(450.0, hidden(), 0.0, ContentMode::NoResize);
        assert!(driver.is_settling());

        let ticks = settle(&mut driver);
        match ticks.last() {
            Some(DriverTick::Settled { target, did_move }) => {
                assert_eq!(*target, hidden());
                assert_eq!(*did_move, Some(hidden()));
            }
            other => panic!("expected settle, got {other:?}"),
        }
        assert!(!driver.is_settling());
        assert_eq!(driver.last_propagated(), Some(hidden()));
    }

    #[test]
    fn repeated_commit_of_same_target_coalesces() {
        let mut driver = AnimationDriver::new(SettleTuning::default());
        driver.commit(450.0, hidden(), 0.0, ContentMode::NoResize);
        driver.tick(MS_16);
        driver.commit(450.0, hidden(), 0.0, ContentMode::NoResize);

        let announced = settle(&mut driver)
            .into_iter()
            .filter(|t| matches!(t, DriverTick::Settled { did_move: Some(_), .. }))
            .count();
        assert_eq!(announced, 1);

        driver.commit(600.0, hidden(), 0.0, ContentMode::NoResize);
        let last = settle(&mut driver).pop();
        assert!(
            matches!(last, Some(DriverTick::Settled { did_move: None, .. })),
            "already propagated: {last:?}"
        );
    }

    #[test]
    fn commit_mid_flight_starts_from_current_value() {
        let mut driver = AnimationDriver::new(SettleTuning::default());
        driver.commit(300.0, hidden(), 0.0, ContentMode::NoResize);
        for _ in 0..5 {
            driver.tick(MS_16);
        }
        let mid = driver.value().expect("in flight");
        assert!(mid > 300.0 && mid < 600.0, "mid = {mid}");

        driver.commit(0.0, half(), 0.0, ContentMode::NoResize);
        assert_eq!(driver.value(), Some(mid), "no jump on recommit");
        assert_eq!(driver.target(), Some(half()));
    }

    #[test]
    fn seed_velocity_moves_faster_initially() {
        let mut slow = AnimationDriver::new(SettleTuning::default());
        let mut fast = AnimationDriver::new(SettleTuning::default());
        slow.commit(450.0, hidden(), 0.0, ContentMode::NoResize);
        fast.commit(450.0, hidden(), 5.0, ContentMode::NoResize);
        slow.tick(MS_16);
        fast.tick(MS_16);
        assert!(fast.value().unwrap() > slow.value().unwrap());
    }

    #[test]
    fn non_finite_seed_is_zero() {
        let mut driver = AnimationDriver::new(SettleTuning::default());
        driver.commit(450.0, hidden(), f64::NAN, ContentMode::NoResize);
        driver.tick(MS_16);
        let v = driver.value().unwrap();
        assert!(v.is_finite() && v >= 450.0);
    }

    #[test]
    fn profile_depends_on_mode_and_speed() {
        let tuning = SettleTuning::default();
        let still = tuning.profile(ContentMode::NoResize, 0.0);
        assert_eq!(still.damping_ratio, 0.9);
        let resize = tuning.profile(ContentMode::ResizeToVisibleArea, 0.0);
        assert!(resize.damping_ratio < still.damping_ratio);

        let flung = tuning.profile(ContentMode::NoResize, 40.0);
        assert!((flung.response - still.response * 0.65).abs() < 1e-12);
        assert_eq!(tuning.profile(ContentMode::NoResize, f64::INFINITY), still);
    }

    #[test]
    fn interrupt_keeps_value_and_drops_completion() {
        let mut driver = AnimationDriver::new(SettleTuning::default());
        driver.commit(300.0, hidden(), 0.0, ContentMode::NoResize);
        driver.tick(MS_16);
        let before = driver.value().unwrap();
        assert_eq!(driver.interrupt(), Some(before));
        assert_eq!(driver.tick(MS_16), DriverTick::Idle);
        assert_eq!(driver.last_propagated(), None);
    }

    #[test]
    fn scrub_sets_fractions_by_side() {
        let mut driver = AnimationDriver::new(SettleTuning::default());
        let upper = SnapPointRange::new(full(), half()).unwrap();
        let lower = SnapPointRange::new(half(), hidden()).unwrap();
        driver.register_auxiliary(upper, scrub_anim(), None);
        driver.register_auxiliary(lower, scrub_anim(), None);
        driver.register_auxiliary(lower, scrub_anim(), None);
        assert_eq!(driver.auxiliary_count(), 3);

        driver.scrub(450.0);
        assert_eq!(driver.auxiliary_fractions(&upper), vec![0.0]);
        assert_eq!(driver.auxiliary_fractions(&lower), vec![0.5, 0.5]);

        driver.scrub(150.0);
        assert_eq!(driver.auxiliary_fractions(&upper), vec![0.5]);
        assert_eq!(driver.auxiliary_fractions(&lower), vec![1.0, 1.0]);
        assert!(!driver.auxiliary_running());
    }

    #[test]
    fn commit_releases_auxiliary_toward_target() {
        let seen = Rc::new(Cell::new(-1.0));
        let probe = seen.clone();
        let mut driver = AnimationDriver::new(SettleTuning::default());
        let lower = SnapPointRange::new(half(), hidden()).unwrap();
        driver.register_auxiliary(
            lower,
            Box::new(ScrubAnimation::new(Duration::from_millis(100)).on_apply(move |v| probe.set(v))),
            None,
        );

        driver.scrub(450.0);
        assert_eq!(seen.get(), 0.5);

        // Uncovering the range runs it forward to 1.
        driver.commit(450.0, half(), 0.0, ContentMode::NoResize);
        assert!(driver.auxiliary_running());
        settle(&mut driver);
        for _ in 0..10 {
            driver.tick(MS_16);
        }
        assert_eq!(driver.auxiliary_fractions(&lower), vec![1.0]);
        assert_eq!(seen.get(), 1.0);

        // Covering it again runs it reversed to 0.
        driver.commit(300.0, hidden(), 0.0, ContentMode::NoResize);
        settle(&mut driver);
        for _ in 0..10 {
            driver.tick(MS_16);
        }
        assert_eq!(driver.auxiliary_fractions(&lower), vec![0.0]);
    }

    #[test]
    fn register_scrubs_to_current_offset() {
        let mut driver = AnimationDriver::new(SettleTuning::default());
        let lower = SnapPointRange::new(half(), hidden()).unwrap();
        driver.register_auxiliary(lower, scrub_anim(), Some(300.0));
        assert_eq!(driver.auxiliary_fractions(&lower), vec![1.0]);
    }

    #[test]
    fn jump_places_and_announces() {
        let mut driver = AnimationDriver::new(SettleTuning::default());
        let lower = SnapPointRange::new(half(), hidden()).unwrap();
        driver.register_auxiliary(lower, scrub_anim(), None);
        assert_eq!(driver.jump(half()), Some(half()));
        assert_eq!(driver.jump(half()), None);
        assert_eq!(driver.auxiliary_fractions(&lower), vec![1.0]);
    }

    #[test]
    fn silent_retarget_updates_propagated_point() {
        let mut driver = AnimationDriver::new(SettleTuning::default());
        driver.mark_propagated(half());
        let moved = ResolvedSnapPoint::new(320.0, SnapPoint::HALF);
        driver.retarget_silently(300.0, moved, ContentMode::NoResize);
        assert_eq!(driver.last_propagated(), Some(moved));

        let last = settle(&mut driver).pop();
        assert_eq!(
            last,
            Some(DriverTick::Settled {
                target: moved,
                did_move: None
            })
        );
    }

    #[test]
    fn rekey_follows_sources_into_new_geometry() {
        use crate::host::Geometry;
        use snapsheet_core::geometry::Size;

        let mut driver = AnimationDriver::new(SettleTuning::default());
        driver.mark_propagated(half());
        let lower = SnapPointRange::new(half(), hidden()).unwrap();
        driver.register_auxiliary(lower, scrub_anim(), None);

        let geometry = Geometry {
            size: Size::new(400.0, 800.0),
            top_margin: 0.0,
        };
        let taller = crate::resolver::resolve(
            &[SnapPoint::FULL, SnapPoint::HALF, SnapPoint::HIDDEN],
            geometry,
            None,
        )
        .unwrap();
        driver.rekey(&taller);

        let half_400 = ResolvedSnapPoint::new(400.0, SnapPoint::HALF);
        assert_eq!(driver.last_propagated(), Some(half_400));
        let moved = taller.range_between(SnapPoint::HALF, SnapPoint::HIDDEN).unwrap();
        assert_eq!(driver.auxiliary_fractions(&moved).len(), 1);
        assert!(driver.auxiliary_fractions(&lower).is_empty());

        let without_hidden =
            crate::resolver::resolve(&[SnapPoint::FULL, SnapPoint::HALF], geometry, None).unwrap();
        driver.rekey(&without_hidden);
        assert_eq!(driver.auxiliary_count(), 0);
    }
}
