#![forbid(unsafe_code)]

//! Scrubbable progress animation.
//!
//! A [`ScrubAnimation`] is a fixed-duration progress animation whose
//! fraction can be driven externally (scrubbed) while paused, then released
//! to run to either end on its own clock. It is the building block for
//! effects that should track a drag exactly and then finish smoothly once
//! the finger lifts.
//!
//! # Invariants
//!
//! 1. `fraction_complete()` is always in [0.0, 1.0].
//! 2. `set_fraction_complete()` leaves the animation `Paused`.
//! 3. `tick()` only advances in `Playing`; a reversed animation counts down.
//! 4. Reaching 1.0 (forward) or 0.0 (reversed) transitions to `Finished`.
//! 5. The apply callback, if any, observes every change of `value()`.
//!
//! # Failure Modes
//!
//! - Zero duration: clamped to 1ns, so a resumed animation finishes on the
//!   next tick.
//! - Non-finite fraction: treated as 0.0.

use web_time::Duration;

use super::{clip01, linear, Animation, EasingFn};

/// Playback state of a [`ScrubAnimation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Never started.
    Idle,
    /// Running on its own clock.
    Playing,
    /// Held at a fraction; driven externally.
    Paused,
    /// Reached the end in the current direction.
    Finished,
}

/// An animation that supports pause, reverse, and fractional scrubbing.
///
/// The snap-point engine stores auxiliary animations behind this trait so
/// hosts may supply their own implementations.
pub trait Scrubbable: Animation {
    /// Current fraction in [0.0, 1.0], before easing.
    fn fraction_complete(&self) -> f64;

    /// Jump to `fraction` and hold there (implies pause).
    fn set_fraction_complete(&mut self, fraction: f64);

    /// Stop advancing on the animation's own clock.
    fn pause(&mut self);

    /// Continue toward 1.0, or toward 0.0 when `reversed`.
    fn resume(&mut self, reversed: bool);

    /// Whether the animation is advancing on its own clock.
    fn is_running(&self) -> bool;
}

type ApplyFn = Box<dyn FnMut(f64)>;

/// Fixed-duration progress animation with scrubbing support.
pub struct ScrubAnimation {
    fraction: f64,
    duration: Duration,
    easing: EasingFn,
    state: PlaybackState,
    reversed: bool,
    apply: Option<ApplyFn>,
}

impl std::fmt::Debug for ScrubAnimation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrubAnimation")
            .field("fraction", &self.fraction)
            .field("duration", &self.duration)
            .field("state", &self.state)
            .field("reversed", &self.reversed)
            .field("has_apply", &self.apply.is_some())
            .finish()
    }
}

impl ScrubAnimation {
    /// Create an idle animation with the given duration and linear easing.
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            fraction: 0.0,
            duration: if duration.is_zero() {
                Duration::from_nanos(1)
            } else {
                duration
            },
            easing: linear,
            state: PlaybackState::Idle,
            reversed: false,
            apply: None,
        }
    }

    /// Set the easing function (builder pattern).
    #[must_use]
    pub fn easing(mut self, easing: EasingFn) -> Self {
        self.easing = easing;
        self
    }

    /// Register a closure receiving the eased value on every change
    /// (builder pattern).
    #[must_use]
    pub fn on_apply(mut self, apply: impl FnMut(f64) + 'static) -> Self {
        self.apply = Some(Box::new(apply));
        self
    }

    /// Current playback state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Whether the animation is counting down.
    #[inline]
    #[must_use]
    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// Total duration for a full 0→1 run.
    #[inline]
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    fn set_fraction_raw(&mut self, fraction: f64) {
        let fraction = clip01(fraction);
        if (fraction - self.fraction).abs() > f64::EPSILON || self.state == PlaybackState::Idle {
            self.fraction = fraction;
            let value = (self.easing)(fraction);
            if let Some(apply) = self.apply.as_mut() {
                apply(value);
            }
        }
    }

    fn at_end(&self) -> bool {
        if self.reversed {
            self.fraction <= 0.0
        } else {
            self.fraction >= 1.0
        }
    }
}

impl Animation for ScrubAnimation {
    fn tick(&mut self, dt: Duration) {
        if self.state != PlaybackState::Playing {
            return;
        }
        let step = dt.as_secs_f64() / self.duration.as_secs_f64();
        let next = if self.reversed {
            self.fraction - step
        } else {
            self.fraction + step
        };
        self.set_fraction_raw(next);
        if self.at_end() {
            self.state = PlaybackState::Finished;
        }
    }

    fn is_complete(&self) -> bool {
        self.state == PlaybackState::Finished
    }

    fn value(&self) -> f64 {
        (self.easing)(self.fraction)
    }

    fn reset(&mut self) {
        self.reversed = false;
        self.set_fraction_raw(0.0);
        self.state = PlaybackState::Idle;
    }
}

impl Scrubbable for ScrubAnimation {
    fn fraction_complete(&self) -> f64 {
        self.fraction
    }

    fn set_fraction_complete(&mut self, fraction: f64) {
        self.state = PlaybackState::Paused;
        self.set_fraction_raw(fraction);
    }

    fn pause(&mut self) {
        if matches!(self.state, PlaybackState::Playing | PlaybackState::Idle) {
            self.state = PlaybackState::Paused;
        }
    }

    fn resume(&mut self, reversed: bool) {
        self.reversed = reversed;
        self.state = if self.at_end() {
            PlaybackState::Finished
        } else {
            PlaybackState::Playing
        };
        crate::trace!(
            fraction = self.fraction,
            reversed = reversed,
            "scrub animation resumed"
        );
    }

    fn is_running(&self) -> bool {
        self.state == PlaybackState::Playing
    }
}
