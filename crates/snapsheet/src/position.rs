#![forbid(unsafe_code)]

//! Classifying a live offset against the resolved snap points.
//!
//! # Invariants
//!
//! 1. `classify` is total over finite offsets and non-empty point sets.
//! 2. `Between(range)` always satisfies
//!    `range.start.offset <= offset <= range.end.offset`.
//! 3. Every resolved point classifies as `Exact` of itself.
//!
//! # Failure Modes
//!
//! - An empty point slice panics: there is no meaningful position without
//!   a layout, and callers only classify after a successful resolve.
//! - A NaN offset has no ordering; it classifies as `OutsideStart` of the
//!   most expanded point.

use crate::snap_point::{ResolvedSnapPoint, SnapPointRange};

/// Where an offset sits relative to the snap points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// On a snap point (after rounding).
    Exact(ResolvedSnapPoint),
    /// Strictly between two neighbouring snap points.
    Between(SnapPointRange),
    /// Past the most expanded point.
    OutsideStart(ResolvedSnapPoint),
    /// Past the most hidden point.
    OutsideEnd(ResolvedSnapPoint),
}

impl Classification {
    /// Whether the offset has travelled past the outermost points.
    #[inline]
    #[must_use]
    pub fn is_outside(&self) -> bool {
        matches!(self, Self::OutsideStart(_) | Self::OutsideEnd(_))
    }

    /// The boundary point for `Exact` and `Outside*`; `None` for `Between`.
    #[must_use]
    pub fn point(&self) -> Option<ResolvedSnapPoint> {
        match *self {
            Self::Exact(p) | Self::OutsideStart(p) | Self::OutsideEnd(p) => Some(p),
            Self::Between(_) => None,
        }
    }

    /// The range for `Between`.
    #[must_use]
    pub fn range(&self) -> Option<SnapPointRange> {
        match *self {
            Self::Between(range) => Some(range),
            _ => None,
        }
    }

    /// The snap point nearest to `offset` among this classification's
    /// bounding points. Equidistant `Between` offsets resolve to `end`.
    #[must_use]
    pub fn nearest(&self, offset: f64) -> ResolvedSnapPoint {
        match *self {
            Self::Exact(p) | Self::OutsideStart(p) | Self::OutsideEnd(p) => p,
            Self::Between(range) => {
                let to_start = (offset - range.start.offset).abs();
                let to_end = (range.end.offset - offset).abs();
                if to_start < to_end {
                    range.start
                } else {
                    range.end
                }
            }
        }
    }
}

/// A live offset with its classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub offset: f64,
    pub classification: Classification,
}

impl Position {
    /// Classify `offset` against `points`.
    ///
    /// # Panics
    ///
    /// Panics if `points` is empty.
    #[must_use]
    pub fn of(offset: f64, points: &[ResolvedSnapPoint]) -> Self {
        Self {
            offset,
            classification: classify(offset, points),
        }
    }
}

/// Classify `offset` against `points`, which must be sorted ascending.
///
/// # Panics
///
/// Panics if `points` is empty.
#[must_use]
pub fn classify(offset: f64, points: &[ResolvedSnapPoint]) -> Classification {
    assert!(!points.is_empty(), "classify requires at least one snap point");

    let rounded = offset.round();
    if let Some(p) = points.iter().find(|p| p.offset == rounded) {
        return Classification::Exact(*p);
    }

    let lower = points.iter().rev().find(|p| p.offset <= offset).copied();
    let upper = points.iter().find(|p| p.offset >= offset).copied();

    match (lower, upper) {
        (Some(lo), Some(hi)) => match SnapPointRange::new(lo, hi) {
            Some(range) => Classification::Between(range),
            // Only reachable with unsorted input.
            None => Classification::Exact(lo),
        },
        (None, Some(hi)) => Classification::OutsideStart(hi),
        (Some(lo), None) => Classification::OutsideEnd(lo),
        (None, None) => Classification::OutsideStart(points[0]),
    }
}
