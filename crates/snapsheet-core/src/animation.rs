#![forbid(unsafe_code)]

//! Composable animation primitives.
//!
//! Two families live here:
//!
//! - [`Spring`]: a damped harmonic oscillator over raw `f64` positions,
//!   seeded with an initial velocity so a released drag keeps its momentum.
//! - [`ScrubAnimation`]: a progress animation that can be paused and
//!   driven by an external fraction (a drag), then released to finish on
//!   its own clock, forward or reversed.
//!
//! Both implement [`Animation`]. The caller owns the frame clock and calls
//! [`Animation::tick`] once per frame.

pub mod scrub;
pub mod spring;

pub use scrub::{PlaybackState, ScrubAnimation, Scrubbable};
pub use spring::{Spring, SpringProfile};

use web_time::Duration;

// ---------------------------------------------------------------------------
// Easing functions
// ---------------------------------------------------------------------------

/// Easing function signature: maps `t` in [0, 1] to output in [0, 1].
pub type EasingFn = fn(f64) -> f64;

/// Identity easing (constant velocity).
#[inline]
pub fn linear(t: f64) -> f64 {
    t.clamp(0.0, 1.0)
}

/// Quadratic ease-out (slow end).
#[inline]
pub fn ease_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Quadratic ease-in-out (slow start and end).
#[inline]
pub fn ease_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// Cubic ease-out (slower end than quadratic).
#[inline]
pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Clamp to [0, 1], mapping NaN to 0.
#[inline]
pub fn clip01(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Animation trait
// ---------------------------------------------------------------------------

/// A frame-driven animation.
pub trait Animation {
    /// Advance the animation by `dt`.
    fn tick(&mut self, dt: Duration);

    /// Whether the animation has reached its end.
    fn is_complete(&self) -> bool;

    /// Current normalized output value, clamped to [0.0, 1.0].
    fn value(&self) -> f64;

    /// Reset the animation to its initial state.
    fn reset(&mut self);
}
