#![forbid(unsafe_code)]

//! Host seams: geometry and content sizing.
//!
//! The engine never walks a view hierarchy or reads global state. Each
//! layout pass it asks a [`LayoutHost`] for the bounds, the top margin, and
//! (only when an `AutoFit` point is configured) the content's natural
//! height. Anything that shrinks the usable area, such as an on-screen
//! keyboard, is the host's to fold into those answers.

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use snapsheet_core::geometry::Size;

/// Geometry queries the engine makes of its host.
pub trait LayoutHost {
    /// Current bounding size, or `None` if the host cannot report one yet.
    fn bounds_size(&self) -> Option<Size>;

    /// Space reserved above the fully expanded sheet.
    fn top_margin(&self) -> f64 {
        0.0
    }

    /// Whether the sheet embeds any content at all.
    fn has_content(&self) -> bool {
        true
    }

    /// Natural height of the content laid out at `width`. `None` is treated
    /// as a natural height of zero.
    fn fitting_height(&self, _width: f64) -> Option<f64> {
        None
    }
}

/// A fixed-size host, handy for tests and headless use.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StaticLayout {
    pub size: Size,
    pub top_margin: f64,
    /// Natural content height; `None` means no embedded content.
    pub content_height: Option<f64>,
}

impl StaticLayout {
    /// A host of the given size with no margin and no content.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            size: Size::new(width, height),
            top_margin: 0.0,
            content_height: None,
        }
    }

    /// Set the top margin (builder pattern).
    #[must_use]
    pub fn with_top_margin(mut self, top_margin: f64) -> Self {
        self.top_margin = top_margin;
        self
    }

    /// Set the content's natural height (builder pattern).
    #[must_use]
    pub fn with_content_height(mut self, height: f64) -> Self {
        self.content_height = Some(height);
        self
    }
}

impl LayoutHost for StaticLayout {
    fn bounds_size(&self) -> Option<Size> {
        Some(self.size)
    }

    fn top_margin(&self) -> f64 {
        self.top_margin
    }

    fn has_content(&self) -> bool {
        self.content_height.is_some()
    }

    fn fitting_height(&self, _width: f64) -> Option<f64> {
        self.content_height
    }
}

/// Geometry inputs to one resolution pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub size: Size,
    pub top_margin: f64,
}

impl Geometry {
    /// Height the sheet can occupy when fully expanded.
    #[inline]
    #[must_use]
    pub fn max_expansion_height(&self) -> f64 {
        self.size.height - self.top_margin
    }
}

/// How the host sizes content while the sheet moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "snake_case"))]
pub enum ContentMode {
    /// Content keeps its full height and is only translated.
    #[default]
    NoResize,
    /// Content is resized to the visible area as the sheet moves.
    ResizeToVisibleArea,
}
