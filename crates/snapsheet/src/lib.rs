#![forbid(unsafe_code)]

//! Interactive snap-point engine for draggable sheets.
//!
//! # Role in snapsheet
//! `snapsheet` turns abstract resting positions into concrete offsets,
//! tracks a drag frame by frame, decides whether the sheet or an embedded
//! scrollable receives the finger, and settles on release with a spring
//! seeded by the release velocity.
//!
//! # Primary responsibilities
//! - **Resolution**: [`SnapPoint`] descriptions to a sorted, de-duplicated
//!   [`ResolvedState`] for the current geometry.
//! - **Classification**: a live offset as `Exact`, `Between`, or outside the
//!   outermost points.
//! - **Arbitration**: [`ScrollArbiter`] pins whichever of sheet and
//!   scrollable is not receiving the drag.
//! - **Animation**: [`AnimationDriver`] runs the settle spring and scrubs
//!   range-scoped auxiliary animations.
//! - **Control**: [`SheetController`] composes the above into the
//!   `Idle → Tracking → Settling` state machine.
//!
//! # How it fits in the system
//! The host owns rendering, touch input, and the frame clock. It calls
//! [`SheetController::update_layout`] on every layout pass,
//! [`SheetController::handle_gesture`] for every drag sample, and
//! [`SheetController::tick`] once per frame, then applies
//! [`SheetController::offset`] to its layout.
//!
//! ```
//! use snapsheet::{SheetConfig, SheetController, SnapPoint, StaticLayout};
//!
//! let mut sheet = SheetController::new(SheetConfig::default()).unwrap();
//! sheet.update_layout(&StaticLayout::new(390.0, 800.0)).unwrap();
//! assert_eq!(sheet.offset(), 0.0);
//!
//! sheet.move_to(SnapPoint::HALF, false).unwrap();
//! assert_eq!(sheet.offset(), 400.0);
//! ```

pub mod animation_driver;
pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod host;
pub mod position;
pub mod resolver;
pub mod scroll_arbiter;
pub mod snap_point;

pub use animation_driver::{AnimationDriver, DriverTick, SettleTuning};
pub use config::{ConfigError, SheetConfig};
pub use controller::{SheetController, SheetPhase, SheetSnapshot};
pub use error::SheetError;
pub use event::{SampleOutcome, SheetEvent, SheetObserver};
pub use host::{ContentMode, Geometry, LayoutHost, StaticLayout};
pub use position::{Classification, Position, classify};
pub use resolver::{ResolvedState, resolve, resolve_for_host};
pub use scroll_arbiter::{
    Arbitration, DragDirection, ScrollArbiter, ScrollableHandle, ScrollableRegion,
    VirtualScrollable,
};
pub use snap_point::{ResolvedSnapPoint, SnapPoint, SnapPointRange};

pub use snapsheet_core::animation::{ScrubAnimation, Scrubbable, SpringProfile};
pub use snapsheet_core::geometry::{Point, Size, Vec2};
pub use snapsheet_core::gesture::{DragSample, GesturePhase};
