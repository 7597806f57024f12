//! Error types for the fetch cache
//!
//! Loader failures are never wrapped: they reach the caller as the loader's own
//! error type. The only error this crate defines is the one raised while parsing
//! a TTL specification, which the resolver recovers from internally.

use thiserror::Error;

// == Parse Duration Error ==
/// Failure to parse a duration string such as `"2s"` or `"1h30m"`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseDurationError {
    /// The input was empty
    #[error("empty duration")]
    Empty,

    /// A unit appeared without a preceding number
    #[error("expected a number in duration {0:?}")]
    MissingNumber(String),

    /// A number appeared without a unit
    #[error("missing unit in duration {0:?}")]
    MissingUnit(String),

    /// The unit is not one of ns, us, µs, ms, s, m, h
    #[error("unknown unit {unit:?} in duration {input:?}")]
    UnknownUnit { unit: String, input: String },

    /// Durations cannot be negative
    #[error("negative duration {0:?}")]
    Negative(String),

    /// The value does not fit in a duration
    #[error("duration {0:?} overflows")]
    Overflow(String),
}

// == Result Type Alias ==
/// Convenience Result type for duration parsing.
pub type Result<T> = std::result::Result<T, ParseDurationError>;
