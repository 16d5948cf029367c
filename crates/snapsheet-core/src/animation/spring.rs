#![forbid(unsafe_code)]

//! Damped harmonic oscillator (spring) animation over raw positions.
//!
//! Based on the classical damped spring equation with unit mass:
//!
//!   F = -stiffness × (position - target) - damping × velocity
//!
//! # Parameters
//!
//! Springs are usually described by a [`SpringProfile`] rather than raw
//! coefficients:
//!
//! - **damping_ratio** (ζ): 1.0 is critically damped, below 1.0 overshoots.
//! - **response**: the period of the undamped oscillation in seconds.
//!   Smaller is snappier.
//!
//! which map to `stiffness = (2π / response)²` and
//! `damping = 4π × ζ / response`.
//!
//! # Velocity seeding
//!
//! A spring can start with a non-zero velocity ([`Spring::with_velocity`]).
//! This is what keeps a released drag physically continuous: the settle
//! animation begins moving at the speed the finger left off.
//!
//! # Invariants
//!
//! 1. `position()` is unclamped; springs may overshoot their target.
//! 2. A spring at rest will not move until `retarget()`.
//! 3. On coming to rest the position snaps exactly to the target.
//! 4. `stop()` freezes the spring at its current position (no jump).
//! 5. Profile stiffness is clamped to a small positive minimum; damping
//!    to >= 0.
//!
//! # Failure Modes
//!
//! - Very large dt: subdivided into 4ms steps for stability.
//! - Zero damping: oscillates forever; `is_complete()` may never be true.

use web_time::Duration;

use super::Animation;

/// Maximum dt per integration step (4ms).
const MAX_STEP_SECS: f64 = 0.004;

/// Position delta (points) below which the spring may come to rest.
const REST_THRESHOLD: f64 = 0.01;

/// Velocity (points/sec) below which the spring may come to rest.
const VELOCITY_THRESHOLD: f64 = 0.5;

/// Minimum stiffness to prevent degenerate springs.
const MIN_STIFFNESS: f64 = 0.1;

/// Minimum response (seconds) accepted by [`SpringProfile`].
const MIN_RESPONSE: f64 = 0.01;

// ---------------------------------------------------------------------------
// SpringProfile
// ---------------------------------------------------------------------------

/// Perceptual spring description: damping ratio plus response time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringProfile {
    /// Damping ratio (1.0 = critical).
    pub damping_ratio: f64,
    /// Undamped period in seconds.
    pub response: f64,
}

impl SpringProfile {
    /// Create a profile. Response is clamped to a small positive minimum and
    /// damping ratio to >= 0.
    #[must_use]
    pub fn new(damping_ratio: f64, response: f64) -> Self {
        Self {
            damping_ratio: damping_ratio.max(0.0),
            response: response.max(MIN_RESPONSE),
        }
    }

    /// Critically damped profile with the given response.
    #[must_use]
    pub fn critical(response: f64) -> Self {
        Self::new(1.0, response)
    }

    /// Return a copy with the response scaled by `factor`.
    #[must_use]
    pub fn scaled_response(self, factor: f64) -> Self {
        Self::new(self.damping_ratio, self.response * factor)
    }

    /// Equivalent stiffness coefficient (unit mass).
    #[must_use]
    pub fn stiffness(&self) -> f64 {
        let omega = std::f64::consts::TAU / self.response;
        omega * omega
    }

    /// Equivalent damping coefficient (unit mass).
    #[must_use]
    pub fn damping(&self) -> f64 {
        4.0 * std::f64::consts::PI * self.damping_ratio / self.response
    }
}

impl Default for SpringProfile {
    fn default() -> Self {
        Self::new(0.9, 0.4)
    }
}

// ---------------------------------------------------------------------------
// Spring
// ---------------------------------------------------------------------------

/// A damped harmonic oscillator producing physically-based motion.
///
/// ```ignore
/// use web_time::Duration;
/// use snapsheet_core::animation::{Spring, SpringProfile};
///
/// let mut spring = Spring::new(450.0, 600.0)
///     .with_profile(SpringProfile::new(0.9, 0.4))
///     .with_velocity(800.0);
///
/// for _ in 0..120 {
///     spring.advance(Duration::from_millis(16));
/// }
/// assert!(spring.is_at_rest());
/// ```
#[derive(Debug, Clone)]
pub struct Spring {
    position: f64,
    velocity: f64,
    target: f64,
    initial: f64,
    initial_velocity: f64,
    stiffness: f64,
    damping: f64,
    at_rest: bool,
}

impl Spring {
    /// Create a spring starting at `initial` and targeting `target`, using
    /// the default profile and zero velocity.
    #[must_use]
    pub fn new(initial: f64, target: f64) -> Self {
        let profile = SpringProfile::default();
        Self {
            position: initial,
            velocity: 0.0,
            target,
            initial,
            initial_velocity: 0.0,
            stiffness: profile.stiffness().max(MIN_STIFFNESS),
            damping: profile.damping(),
            at_rest: false,
        }
    }

    /// Apply a perceptual profile (builder pattern).
    #[must_use]
    pub fn with_profile(mut self, profile: SpringProfile) -> Self {
        self.stiffness = profile.stiffness().max(MIN_STIFFNESS);
        self.damping = profile.damping().max(0.0);
        self
    }

    /// Seed the initial velocity in points/sec (builder pattern).
    ///
    /// Non-finite velocities are treated as zero.
    #[must_use]
    pub fn with_velocity(mut self, velocity: f64) -> Self {
        let velocity = if velocity.is_finite() { velocity } else { 0.0 };
        self.velocity = velocity;
        self.initial_velocity = velocity;
        self
    }

    /// Current position (unclamped).
    #[inline]
    #[must_use]
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Current velocity.
    #[inline]
    #[must_use]
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Current target.
    #[inline]
    #[must_use]
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Position the spring started from.
    #[inline]
    #[must_use]
    pub fn initial(&self) -> f64 {
        self.initial
    }

    /// Stiffness parameter.
    #[inline]
    #[must_use]
    pub fn stiffness(&self) -> f64 {
        self.stiffness
    }

    /// Damping parameter.
    #[inline]
    #[must_use]
    pub fn damping(&self) -> f64 {
        self.damping
    }

    /// Whether the spring has settled at the target.
    #[inline]
    #[must_use]
    pub fn is_at_rest(&self) -> bool {
        self.at_rest
    }

    /// Fraction of the way from `initial` to `target`, unclamped.
    ///
    /// A spring whose initial position equals its target reports 1.0.
    #[must_use]
    pub fn progress(&self) -> f64 {
        let span = self.target - self.initial;
        if span.abs() < f64::EPSILON {
            1.0
        } else {
            (self.position - self.initial) / span
        }
    }

    /// Change the target, keeping position and velocity. Wakes the spring
    /// if the target moved by more than the rest threshold.
    pub fn retarget(&mut self, target: f64) {
        if (self.target - target).abs() > REST_THRESHOLD {
            crate::trace!(from = self.target, to = target, "spring retarget");
            self.initial = self.position;
            self.target = target;
            self.at_rest = false;
        }
    }

    /// Freeze the spring where it is and return that position.
    ///
    /// The target moves to the current position so a later `advance` is a
    /// no-op; this is a stop that keeps the current value, not a jump.
    pub fn stop(&mut self) -> f64 {
        self.target = self.position;
        self.velocity = 0.0;
        self.at_rest = true;
        self.position
    }

    /// Critical damping coefficient for the current stiffness.
    #[must_use]
    pub fn critical_damping(&self) -> f64 {
        2.0 * self.stiffness.sqrt()
    }

    /// Perform a single semi-implicit Euler step of `dt` seconds.
    fn step(&mut self, dt: f64) {
        let displacement = self.position - self.target;
        let spring_force = -self.stiffness * displacement;
        let damping_force = -self.damping * self.velocity;
        let acceleration = spring_force + damping_force;

        self.velocity += acceleration * dt;
        self.position += self.velocity * dt;
    }

    /// Advance the spring by `dt`, subdividing for stability.
    pub fn advance(&mut self, dt: Duration) {
        if self.at_rest {
            return;
        }

        let total_secs = dt.as_secs_f64();
        if total_secs <= 0.0 {
            return;
        }

        let mut remaining = total_secs;
        while remaining > 0.0 {
            let step_dt = remaining.min(MAX_STEP_SECS);
            self.step(step_dt);
            remaining -= step_dt;
        }

        let pos_delta = (self.position - self.target).abs();
        let vel_abs = self.velocity.abs();
        if pos_delta < REST_THRESHOLD && vel_abs < VELOCITY_THRESHOLD {
            self.position = self.target;
            self.velocity = 0.0;
            self.at_rest = true;
        }
    }
}

impl Animation for Spring {
    fn tick(&mut self, dt: Duration) {
        self.advance(dt);
    }

    fn is_complete(&self) -> bool {
        self.at_rest
    }

    /// Progress from initial to target, clamped to [0.0, 1.0].
    fn value(&self) -> f64 {
        super::clip01(self.progress())
    }

    fn reset(&mut self) {
        self.position = self.initial;
        self.velocity = self.initial_velocity;
        self.at_rest = false;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
