#![forbid(unsafe_code)]

//! Drag gesture samples and the tap/drag deadzone.
//!
//! The host owns touch or pointer integration and feeds normalized
//! [`DragSample`]s. Each sample carries the translation since the previous
//! sample, the current velocity, and the window location of the contact.
//!
//! # Deadzone
//!
//! [`DragDeadzone`] swallows `Changed` samples until the cumulative travel
//! since `Began` reaches a threshold, so a tap that wobbles a few points is
//! not mistaken for a drag.
//!
//! # Invariants
//!
//! 1. Once the threshold is crossed, every later sample of the same gesture
//!    passes (the deadzone never re-engages mid-gesture).
//! 2. Travel is measured as the manhattan length of the accumulated
//!    translation.
//! 3. `end()` returns the deadzone to idle; a new `begin()` starts fresh.

use crate::geometry::{Point, Vec2};

/// Phase of a drag gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GesturePhase {
    /// Contact went down.
    Began,
    /// Contact moved.
    Changed,
    /// Contact lifted normally.
    Ended,
    /// The system cancelled the gesture.
    Cancelled,
    /// Recognition failed.
    Failed,
}

impl GesturePhase {
    /// Whether this phase ends the gesture.
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ended | Self::Cancelled | Self::Failed)
    }
}

/// One normalized gesture sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSample {
    pub phase: GesturePhase,
    /// Translation since the previous sample.
    pub translation: Vec2,
    /// Velocity in points/sec; positive `y` moves toward the bottom edge.
    pub velocity: Vec2,
    /// Contact location in window coordinates.
    pub location: Point,
}

impl DragSample {
    /// A `Began` sample at `location`.
    #[must_use]
    pub fn began(location: Point) -> Self {
        Self {
            phase: GesturePhase::Began,
            translation: Vec2::ZERO,
            velocity: Vec2::ZERO,
            location,
        }
    }

    /// A vertical `Changed` sample moving by `dy`.
    #[must_use]
    pub fn changed(dy: f64, velocity_y: f64) -> Self {
        Self {
            phase: GesturePhase::Changed,
            translation: Vec2::new(0.0, dy),
            velocity: Vec2::new(0.0, velocity_y),
            location: Point::ZERO,
        }
    }

    /// An `Ended` sample released with `velocity`.
    #[must_use]
    pub fn ended(velocity: Vec2) -> Self {
        Self {
            phase: GesturePhase::Ended,
            translation: Vec2::ZERO,
            velocity,
            location: Point::ZERO,
        }
    }

    /// A `Cancelled` sample.
    #[must_use]
    pub fn cancelled() -> Self {
        Self {
            phase: GesturePhase::Cancelled,
            ..Self::ended(Vec2::ZERO)
        }
    }

    /// Set the contact location (builder pattern).
    #[must_use]
    pub fn at(mut self, location: Point) -> Self {
        self.location = location;
        self
    }

    /// Set the translation (builder pattern).
    #[must_use]
    pub fn with_translation(mut self, translation: Vec2) -> Self {
        self.translation = translation;
        self
    }

    /// Set the velocity (builder pattern).
    #[must_use]
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }
}

/// Default deadzone in points.
pub const DEFAULT_DRAG_THRESHOLD: f64 = 4.0;

/// Swallows early samples until travel exceeds a threshold.
#[derive(Debug, Clone)]
pub struct DragDeadzone {
    threshold: f64,
    start: Option<Point>,
    travel: Vec2,
    passed: bool,
}

impl Default for DragDeadzone {
    fn default() -> Self {
        Self::new(DEFAULT_DRAG_THRESHOLD)
    }
}

impl DragDeadzone {
    /// Create a deadzone with the given threshold (points). Negative values
    /// are treated as zero.
    #[must_use]
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.max(0.0),
            start: None,
            travel: Vec2::ZERO,
            passed: false,
        }
    }

    /// Start tracking a new gesture at `location`.
    pub fn begin(&mut self, location: Point) {
        self.start = Some(location);
        self.travel = Vec2::ZERO;
        self.passed = self.threshold <= 0.0;
    }

    /// Record a sample's translation. Returns `true` if the sample should
    /// be honored.
    pub fn admit(&mut self, translation: Vec2) -> bool {
        if self.start.is_none() {
            return false;
        }
        if self.passed {
            return true;
        }
        self.travel += translation;
        if self.travel.manhattan_length() >= self.threshold {
            self.passed = true;
        }
        self.passed
    }

    /// Whether the gesture has left the deadzone.
    #[inline]
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.start.is_some() && self.passed
    }

    /// Location the gesture began at, if tracking.
    #[inline]
    #[must_use]
    pub fn start(&self) -> Option<Point> {
        self.start
    }

    /// Stop tracking.
    pub fn end(&mut self) {
        self.start = None;
        self.travel = Vec2::ZERO;
        self.passed = false;
    }
}
