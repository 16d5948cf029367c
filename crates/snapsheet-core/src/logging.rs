#![forbid(unsafe_code)]

//! Logging and tracing support.
//!
//! Re-exports `tracing::trace` when the `tracing` feature is enabled.
//! Without the feature, a no-op macro keeps call sites compiling.

#[cfg(feature = "tracing")]
pub use tracing::trace;

#[cfg(not(feature = "tracing"))]
mod noop_macros {
    /// No-op trace macro when tracing is disabled.
    #[macro_export]
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }
}
