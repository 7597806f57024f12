//! TTL Resolution Module
//!
//! Parses duration strings such as `"2s"`, `"5m"` or `"1h30m"` and memoizes the
//! resolved TTL for a cache instance.

use std::time::Duration;

use parking_lot::Mutex;
use tracing::warn;

use crate::error::{ParseDurationError, Result};

// == Public Constants ==
/// TTL used when the configured TTL string cannot be parsed.
pub const FALLBACK_TTL: Duration = Duration::from_secs(5 * 60);

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Fraction digits beyond this scale cannot change the nanosecond result.
const MAX_FRACTION_SCALE: u128 = 100_000_000_000_000_000_000;

// == Parse Duration ==
/// Parses a duration made of one or more `<number><unit>` groups.
///
/// Numbers may carry a fractional part (`"1.5s"`). Valid units are `ns`, `us`
/// (also `µs`/`μs`), `ms`, `s`, `m` and `h`. A bare `"0"` is accepted; any other
/// number needs a unit. A leading sign is allowed, but any negative duration
/// other than zero (`"-0"`, `"-0s"`) is rejected.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use fetch_cache::parse_duration;
///
/// assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
/// assert!(parse_duration("15 kps").is_err());
/// ```
pub fn parse_duration(input: &str) -> Result<Duration> {
    if input.is_empty() {
        return Err(ParseDurationError::Empty);
    }
    let (negative, mut rest) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input.strip_prefix('+').unwrap_or(input)),
    };
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(ParseDurationError::MissingNumber(input.to_string()));
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let (whole, after_whole) = split_digits(rest);
        let (fraction, after_number) = match after_whole.strip_prefix('.') {
            Some(tail) => split_digits(tail),
            None => ("", after_whole),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(ParseDurationError::MissingNumber(input.to_string()));
        }

        let unit_end = after_number
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(after_number.len());
        let (unit, tail) = after_number.split_at(unit_end);
        if unit.is_empty() {
            return Err(ParseDurationError::MissingUnit(input.to_string()));
        }
        let scale_nanos = unit_nanos(unit).ok_or_else(|| ParseDurationError::UnknownUnit {
            unit: unit.to_string(),
            input: input.to_string(),
        })?;

        let overflow = || ParseDurationError::Overflow(input.to_string());
        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| overflow())?
        };
        let mut nanos = whole.checked_mul(scale_nanos).ok_or_else(overflow)?;

        if !fraction.is_empty() {
            let mut numerator: u128 = 0;
            let mut scale: u128 = 1;
            for digit in fraction.bytes() {
                if scale >= MAX_FRACTION_SCALE {
                    break;
                }
                numerator = numerator * 10 + u128::from(digit - b'0');
                scale *= 10;
            }
            nanos = nanos
                .checked_add(numerator * scale_nanos / scale)
                .ok_or_else(overflow)?;
        }

        total = total.checked_add(nanos).ok_or_else(overflow)?;
        rest = tail;
    }

    if negative && total > 0 {
        return Err(ParseDurationError::Negative(input.to_string()));
    }

    let total =
        u64::try_from(total).map_err(|_| ParseDurationError::Overflow(input.to_string()))?;
    Ok(Duration::from_nanos(total))
}

/// Splits off the leading run of ASCII digits.
fn split_digits(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(60 * NANOS_PER_SEC),
        "h" => Some(3600 * NANOS_PER_SEC),
        _ => None,
    }
}

// == TTL Resolver ==
/// Lazily resolves a TTL string once and keeps the result.
///
/// The first [`resolve`](TtlResolver::resolve) parses the TTL string; every later call
/// returns the same duration regardless of the string it is given, until
/// [`reset`](TtlResolver::reset) is called. An unusable string resolves to
/// [`FALLBACK_TTL`], which is then kept like any other resolved value.
#[derive(Debug, Default)]
pub struct TtlResolver {
    resolved: Mutex<Option<Duration>>,
}

impl TtlResolver {
    /// Creates a resolver with nothing resolved yet.
    pub fn new() -> Self {
        Self::default()
    }

    // == Resolve ==
    /// Returns the memoized TTL, parsing `raw` on first use.
    pub fn resolve(&self, raw: &str) -> Duration {
        let mut resolved = self.resolved.lock();
        if let Some(ttl) = *resolved {
            return ttl;
        }

        let ttl = match parse_duration(raw) {
            Ok(ttl) if ttl.is_zero() => {
                warn!(
                    ttl = raw,
                    "Cache TTL must be greater than zero, falling back to 5 minutes"
                );
                FALLBACK_TTL
            }
            Ok(ttl) => ttl,
            Err(e) => {
                warn!(
                    ttl = raw,
                    error = %e,
                    "Error parsing cache TTL duration, falling back to 5 minutes"
                );
                FALLBACK_TTL
            }
        };

        *resolved = Some(ttl);
        ttl
    }

    /// Returns the memoized TTL without resolving.
    pub fn cached(&self) -> Option<Duration> {
        *self.resolved.lock()
    }

    /// Forgets the memoized TTL so the next `resolve` parses again.
    pub fn reset(&self) {
        *self.resolved.lock() = None;
    }
}
