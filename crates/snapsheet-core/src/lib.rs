#![forbid(unsafe_code)]

//! Core: geometry, animation physics, and drag gesture samples.
//!
//! # Role in snapsheet
//! `snapsheet-core` holds the host-agnostic primitives the snap-point engine
//! is built from. Nothing here knows about snap points; the engine crate
//! (`snapsheet`) composes these pieces into the sheet state machine.
//!
//! # Primary responsibilities
//! - **Geometry**: float `Size`, `Point`, and `Vec2` in layout points.
//! - **Animation**: the [`Animation`](animation::Animation) trait, easing
//!   curves, a velocity-seeded [`Spring`](animation::Spring), and a
//!   scrubbable progress animation for range-scoped effects.
//! - **Gesture**: normalized drag samples and a tap/drag deadzone.

pub mod animation;
pub mod geometry;
pub mod gesture;
pub mod logging;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::trace;
