#![forbid(unsafe_code)]

//! Snap point descriptions, their resolved offsets, and adjacent ranges.
//!
//! Offsets are "distance to hide": 0 is fully expanded, larger values are
//! more hidden. Everything in the engine sorts ascending by offset, so the
//! first resolved point is the most expanded one.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use snapsheet_core::animation::clip01;

/// Abstract resting position of a sheet.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "snake_case"))]
pub enum SnapPoint {
    /// Fraction of the available height that stays visible, in [0, 1].
    Fraction(f64),
    /// Absolute offset from the top margin.
    FromTop(f64),
    /// Absolute distance from the bottom edge.
    FromBottom(f64),
    /// Show exactly the content's natural height.
    AutoFit,
}

impl SnapPoint {
    /// Fully expanded.
    pub const FULL: SnapPoint = SnapPoint::Fraction(1.0);
    /// Half of the available height visible.
    pub const HALF: SnapPoint = SnapPoint::Fraction(0.5);
    /// Just past the bottom edge.
    pub const HIDDEN: SnapPoint = SnapPoint::FromBottom(-8.0);

    /// Identity key: variant tag plus the payload's bit pattern, with
    /// `-0.0` folded into `0.0`.
    fn key(&self) -> (u8, u64) {
        fn bits(v: f64) -> u64 {
            if v == 0.0 { 0 } else { v.to_bits() }
        }
        match *self {
            SnapPoint::Fraction(f) => (0, bits(f)),
            SnapPoint::FromTop(p) => (1, bits(p)),
            SnapPoint::FromBottom(p) => (2, bits(p)),
            SnapPoint::AutoFit => (3, 0),
        }
    }

    /// Short variant name for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            SnapPoint::Fraction(_) => "fraction",
            SnapPoint::FromTop(_) => "from_top",
            SnapPoint::FromBottom(_) => "from_bottom",
            SnapPoint::AutoFit => "auto_fit",
        }
    }
}

impl PartialEq for SnapPoint {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for SnapPoint {}

impl Hash for SnapPoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl std::fmt::Display for SnapPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapPoint::Fraction(v) => write!(f, "fraction({v})"),
            SnapPoint::FromTop(v) => write!(f, "from_top({v})"),
            SnapPoint::FromBottom(v) => write!(f, "from_bottom({v})"),
            SnapPoint::AutoFit => f.write_str("auto_fit"),
        }
    }
}

/// A snap point paired with its pixel offset for the current geometry.
///
/// Ordered by offset; equal only if both offset and source match.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedSnapPoint {
    /// Offset rounded to the nearest whole point.
    pub offset: f64,
    /// The snap point this offset was resolved from.
    pub source: SnapPoint,
}

impl ResolvedSnapPoint {
    /// Pair `source` with `offset`, rounding the offset.
    #[must_use]
    pub fn new(offset: f64, source: SnapPoint) -> Self {
        Self {
            // `+ 0.0` folds a rounded `-0.0` into `0.0` for bitwise identity.
            offset: offset.round() + 0.0,
            source,
        }
    }
}

impl PartialEq for ResolvedSnapPoint {
    fn eq(&self, other: &Self) -> bool {
        self.offset.to_bits() == other.offset.to_bits() && self.source == other.source
    }
}

impl Eq for ResolvedSnapPoint {}

impl Hash for ResolvedSnapPoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.offset.to_bits().hash(state);
        self.source.hash(state);
    }
}

impl PartialOrd for ResolvedSnapPoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ResolvedSnapPoint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.offset
            .total_cmp(&other.offset)
            .then_with(|| self.source.key().cmp(&other.source.key()))
    }
}

/// An ordered pair of resolved points, used as a key for range-scoped
/// auxiliary animations.
///
/// `start.offset < end.offset` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapPointRange {
    pub start: ResolvedSnapPoint,
    pub end: ResolvedSnapPoint,
}

impl SnapPointRange {
    /// Build a range from two points in either order.
    ///
    /// Returns `None` when both points share an offset.
    #[must_use]
    pub fn new(a: ResolvedSnapPoint, b: ResolvedSnapPoint) -> Option<Self> {
        match a.offset.total_cmp(&b.offset) {
            Ordering::Less => Some(Self { start: a, end: b }),
            Ordering::Greater => Some(Self { start: b, end: a }),
            Ordering::Equal => None,
        }
    }

    /// Distance between the endpoints.
    #[inline]
    #[must_use]
    pub fn span(&self) -> f64 {
        self.end.offset - self.start.offset
    }

    /// Whether `offset` lies within `[start, end]`.
    #[inline]
    #[must_use]
    pub fn contains(&self, offset: f64) -> bool {
        offset >= self.start.offset && offset <= self.end.offset
    }

    /// Progress toward `end`, unclamped: 0 at `start`, 1 at `end`.
    #[must_use]
    pub fn progress(&self, offset: f64) -> f64 {
        (offset - self.start.offset) / self.span()
    }

    /// Progress toward `start` (the more visible end), clamped to [0, 1].
    ///
    /// This is the fraction an auxiliary animation keyed to this range
    /// should show when the sheet sits at `offset`.
    #[must_use]
    pub fn visible_progress(&self, offset: f64) -> f64 {
        clip01(1.0 - self.progress(offset))
    }

    /// Whether both endpoints come from the given sources, in any order.
    #[must_use]
    pub fn joins(&self, a: SnapPoint, b: SnapPoint) -> bool {
        (self.start.source == a && self.end.source == b)
            || (self.start.source == b && self.end.source == a)
    }
}

impl std::fmt::Display for SnapPointRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{} @ {}, {} @ {}]",
            self.start.source, self.start.offset, self.end.source, self.end.offset
        )
    }
}
