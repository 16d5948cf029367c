#![forbid(unsafe_code)]

//! Snap point resolution: abstract positions to concrete offsets.
//!
//! # Rules
//!
//! With `max = bounds.height - top_margin`:
//!
//! | Point | Offset |
//! |------|--------|
//! | `Fraction(f)` | `max - max × f` |
//! | `FromTop(p)` | `p` |
//! | `FromBottom(p)` | `max - p` |
//! | `AutoFit` | `max - natural`, clamped to `[0, max]`; `0` without content |
//!
//! Offsets are rounded to whole points so a drag can land on them exactly.
//! Points are de-duplicated by rounded offset (first configured source
//! wins) and sorted ascending.
//!
//! # Invariants
//!
//! 1. A `ResolvedState` is never empty.
//! 2. Resolution is pure: equal inputs give equal states.
//! 3. The content fitting callback runs at most once, and only if an
//!    `AutoFit` point is configured.

use snapsheet_core::geometry::Size;
use tracing::debug;

use crate::error::SheetError;
use crate::host::{Geometry, LayoutHost};
use crate::snap_point::{ResolvedSnapPoint, SnapPoint, SnapPointRange};

/// Sorted, de-duplicated snap points for one geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedState {
    points: Vec<ResolvedSnapPoint>,
    max_expansion_height: f64,
}

impl ResolvedState {
    /// All points, ascending by offset. Never empty.
    #[inline]
    #[must_use]
    pub fn points(&self) -> &[ResolvedSnapPoint] {
        &self.points
    }

    /// Height of the fully expanded sheet.
    #[inline]
    #[must_use]
    pub fn max_expansion_height(&self) -> f64 {
        self.max_expansion_height
    }

    /// The most expanded point (least offset).
    #[must_use]
    pub fn topmost(&self) -> ResolvedSnapPoint {
        self.points[0]
    }

    /// The most hidden point (greatest offset).
    #[must_use]
    pub fn bottommost(&self) -> ResolvedSnapPoint {
        self.points[self.points.len() - 1]
    }

    /// The resolved point whose source is `source`, if it survived
    /// de-duplication.
    #[must_use]
    pub fn find(&self, source: SnapPoint) -> Option<ResolvedSnapPoint> {
        self.points.iter().copied().find(|p| p.source == source)
    }

    /// Range between the points resolved from two sources.
    #[must_use]
    pub fn range_between(&self, a: SnapPoint, b: SnapPoint) -> Option<SnapPointRange> {
        SnapPointRange::new(self.find(a)?, self.find(b)?)
    }

    /// Ranges between each pair of neighbouring points, most expanded first.
    pub fn adjacent_ranges(&self) -> impl Iterator<Item = SnapPointRange> + '_ {
        self.points
            .windows(2)
            .filter_map(|pair| SnapPointRange::new(pair[0], pair[1]))
    }
}

/// Check a configuration without resolving it.
pub fn validate(snap_points: &[SnapPoint]) -> Result<(), SheetError> {
    if snap_points.is_empty() {
        return Err(SheetError::EmptySnapPoints);
    }
    for point in snap_points {
        match *point {
            SnapPoint::Fraction(f) if !(0.0..=1.0).contains(&f) => {
                return Err(SheetError::InvalidFraction(f));
            }
            SnapPoint::FromTop(p) | SnapPoint::FromBottom(p) if !p.is_finite() => {
                return Err(SheetError::NonFiniteOffset(*point));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Resolve `snap_points` against `geometry`.
///
/// `content` is `None` when the sheet has no embedded content; otherwise it
/// is called (lazily, at most once) for the content's natural height.
pub fn resolve(
    snap_points: &[SnapPoint],
    geometry: Geometry,
    content: Option<&dyn Fn() -> Option<f64>>,
) -> Result<ResolvedState, SheetError> {
    validate(snap_points)?;

    let max = geometry.max_expansion_height();
    let mut natural: Option<Option<f64>> = None;
    let mut points: Vec<ResolvedSnapPoint> = Vec::with_capacity(snap_points.len());

    for &source in snap_points {
        let raw = match source {
            SnapPoint::Fraction(f) => max - max * f,
            SnapPoint::FromTop(p) => p,
            SnapPoint::FromBottom(p) => max - p,
            SnapPoint::AutoFit => match content {
                None => 0.0,
                Some(fit) => {
                    let height = *natural.get_or_insert_with(fit);
                    let height = height.filter(|h| h.is_finite()).unwrap_or(0.0);
                    (max - height).clamp(0.0, max.max(0.0))
                }
            },
        };
        let resolved = ResolvedSnapPoint::new(raw, source);
        if !points.iter().any(|p| p.offset == resolved.offset) {
            points.push(resolved);
        }
    }
    points.sort();

    debug!(
        target: "snapsheet.resolve",
        points = points.len(),
        configured = snap_points.len(),
        max_expansion_height = max,
        "resolved snap points"
    );

    Ok(ResolvedState {
        points,
        max_expansion_height: max,
    })
}

/// Read geometry from a host, or `None` if it cannot report a usable size.
#[must_use]
pub fn geometry_of(host: &dyn LayoutHost) -> Option<Geometry> {
    let size: Size = host.bounds_size()?;
    let top_margin = host.top_margin();
    if !size.is_finite() || !top_margin.is_finite() {
        return None;
    }
    Some(Geometry { size, top_margin })
}

/// Resolve against a host. `Ok(None)` means geometry is not yet available.
pub fn resolve_for_host(
    snap_points: &[SnapPoint],
    host: &dyn LayoutHost,
) -> Result<Option<ResolvedState>, SheetError> {
    let Some(geometry) = geometry_of(host) else {
        return Ok(None);
    };
    let width = geometry.size.width;
    let fit = move || host.fitting_height(width);
    let content: Option<&dyn Fn() -> Option<f64>> = if host.has_content() {
        Some(&fit)
    } else {
        None
    };
    resolve(snap_points, geometry, content).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::StaticLayout;
    use std::cell::Cell;

    fn geometry(height: f64, top_margin: f64) -> Geometry {
        Geometry {
            size: Size::new(400.0, height),
            top_margin,
        }
    }

    fn offsets(state: &ResolvedState) -> Vec<f64> {
        state.points().iter().map(|p| p.offset).collect()
    }

    #[test]
    fn resolves_each_kind() {
        let state = resolve(
            &[
                SnapPoint::FULL,
                SnapPoint::Fraction(0.25),
                SnapPoint::FromTop(100.0),
                SnapPoint::FromBottom(200.0),
            ],
            geometry(700.0, 100.0),
            None,
        )
        .expect("valid");
        assert_eq!(state.max_expansion_height(), 600.0);
        assert_eq!(offsets(&state), vec![0.0, 100.0, 400.0, 450.0]);
    }

    #[test]
    fn hidden_sits_past_bottom_edge() {
        let state = resolve(&[SnapPoint::HIDDEN], geometry(600.0, 0.0), None).expect("valid");
        assert_eq!(state.topmost().offset, 608.0);
    }

    #[test]
    fn rounds_to_whole_points() {
        let state = resolve(&[SnapPoint::Fraction(1.0 / 3.0)], geometry(601.0, 0.0), None)
            .expect("valid");
        assert_eq!(state.topmost().offset, 401.0);
    }

    #[test]
    fn deduplicates_by_offset_first_source_wins() {
        let state = resolve(
            &[SnapPoint::HALF, SnapPoint::FromTop(300.0), SnapPoint::FULL],
            geometry(600.0, 0.0),
            None,
        )
        .expect("valid");
        assert_eq!(state.points().len(), 2);
        assert_eq!(state.points()[1].source, SnapPoint::HALF);
        assert!(state.find(SnapPoint::FromTop(300.0)).is_none());
    }

    #[test]
    fn auto_fit_without_content_is_expanded() {
        let state = resolve(&[SnapPoint::AutoFit], geometry(600.0, 0.0), None).expect("valid");
        assert_eq!(state.topmost().offset, 0.0);
    }

    #[test]
    fn auto_fit_uses_natural_height_and_clamps() {
        let fit = || Some(250.0);
        let state = resolve(&[SnapPoint::AutoFit], geometry(600.0, 0.0), Some(&fit)).expect("valid");
        assert_eq!(state.topmost().offset, 350.0);

        let tall = || Some(5_000.0);
        let state = resolve(&[SnapPoint::AutoFit], geometry(600.0, 0.0), Some(&tall)).expect("valid");
        assert_eq!(state.topmost().offset, 0.0);

        let unknown = || None;
        let state =
            resolve(&[SnapPoint::AutoFit], geometry(600.0, 0.0), Some(&unknown)).expect("valid");
        assert_eq!(state.topmost().offset, 600.0);
    }

    #[test]
    fn fitting_callback_runs_once_and_only_for_auto_fit() {
        let calls = Cell::new(0);
        let fit = || {
            calls.set(calls.get() + 1);
            Some(100.0)
        };
        resolve(&[SnapPoint::FULL, SnapPoint::HALF], geometry(600.0, 0.0), Some(&fit))
            .expect("valid");
        assert_eq!(calls.get(), 0);

        resolve(
            &[SnapPoint::AutoFit, SnapPoint::FULL, SnapPoint::AutoFit],
            geometry(600.0, 0.0),
            Some(&fit),
        )
        .expect("valid");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn rejects_bad_configuration() {
        assert_eq!(
            resolve(&[], geometry(600.0, 0.0), None),
            Err(SheetError::EmptySnapPoints)
        );
        assert_eq!(
            validate(&[SnapPoint::Fraction(1.5)]),
            Err(SheetError::InvalidFraction(1.5))
        );
        assert!(matches!(
            validate(&[SnapPoint::Fraction(f64::NAN)]),
            Err(SheetError::InvalidFraction(_))
        ));
        assert_eq!(
            validate(&[SnapPoint::FromTop(f64::INFINITY)]),
            Err(SheetError::NonFiniteOffset(SnapPoint::FromTop(f64::INFINITY)))
        );
    }

    #[test]
    fn resolution_is_idempotent() {
        let config = [SnapPoint::FULL, SnapPoint::HALF, SnapPoint::HIDDEN];
        let a = resolve(&config, geometry(844.0, 44.0), None).expect("valid");
        let b = resolve(&config, geometry(844.0, 44.0), None).expect("valid");
        assert_eq!(a, b);
    }

    #[test]
    fn adjacent_ranges_and_lookup() {
        let state = resolve(
            &[SnapPoint::HIDDEN, SnapPoint::FULL, SnapPoint::HALF],
            geometry(600.0, 0.0),
            None,
        )
        .expect("valid");
        let ranges: Vec<_> = state.adjacent_ranges().collect();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].start.source, SnapPoint::FULL);
        assert_eq!(ranges[1].end.source, SnapPoint::HIDDEN);

        let range = state
            .range_between(SnapPoint::HIDDEN, SnapPoint::HALF)
            .expect("both resolved");
        assert_eq!((range.start.offset, range.end.offset), (300.0, 608.0));
        assert_eq!(state.bottommost().source, SnapPoint::HIDDEN);
    }

    #[test]
    fn host_without_size_defers() {
        struct Unsized;
        impl LayoutHost for Unsized {
            fn bounds_size(&self) -> Option<Size> {
                None
            }
        }
        assert_eq!(resolve_for_host(&[SnapPoint::FULL], &Unsized), Ok(None));
    }

    #[test]
    fn host_content_feeds_auto_fit() {
        let host = StaticLayout::new(400.0, 600.0).with_content_height(200.0);
        let state = resolve_for_host(&[SnapPoint::AutoFit], &host)
            .expect("valid")
            .expect("sized");
        assert_eq!(state.topmost().offset, 400.0);

        let empty = StaticLayout::new(400.0, 600.0);
        let state = resolve_for_host(&[SnapPoint::AutoFit], &empty)
            .expect("valid")
            .expect("sized");
        assert_eq!(state.topmost().offset, 0.0);
    }
}
