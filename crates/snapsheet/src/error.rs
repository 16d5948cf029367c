#![forbid(unsafe_code)]

//! Engine error types.

use crate::snap_point::SnapPoint;

/// Misconfiguration or misuse of the sheet engine.
#[derive(Debug, Clone, PartialEq)]
pub enum SheetError {
    /// The configuration lists no snap points.
    EmptySnapPoints,
    /// A `Fraction` outside [0, 1] or not finite.
    InvalidFraction(f64),
    /// A `FromTop`/`FromBottom` offset that is not finite.
    NonFiniteOffset(SnapPoint),
    /// A tuning parameter that must be finite and non-negative is not.
    InvalidParameter(&'static str),
    /// `move_to` named a snap point absent from the resolved set.
    UnknownSnapPoint(SnapPoint),
    /// An auxiliary range whose endpoints resolve to the same offset.
    DegenerateRange(SnapPoint, SnapPoint),
    /// The operation needs a resolved layout and none exists yet.
    NotLaidOut,
}

impl std::fmt::Display for SheetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySnapPoints => f.write_str("at least one snap point is required"),
            Self::InvalidFraction(v) => write!(f, "snap point fraction {v} is outside [0, 1]"),
            Self::NonFiniteOffset(p) => write!(f, "snap point {p} has a non-finite offset"),
            Self::InvalidParameter(name) => {
                write!(f, "parameter `{name}` must be finite and non-negative")
            }
            Self::UnknownSnapPoint(p) => write!(f, "snap point {p} is not in the resolved set"),
            Self::DegenerateRange(a, b) => {
                write!(f, "snap points {a} and {b} do not span a range")
            }
            Self::NotLaidOut => f.write_str("sheet has not been laid out yet"),
        }
    }
}

impl std::error::Error for SheetError {}
