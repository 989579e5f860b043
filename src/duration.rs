//! Duration token normalization.
//!
//! Tenzir reports operator timings as strings with a trailing unit
//! (`"12.5ms"`, `"2.0s"`). Stripping by character class is unsafe
//! because an exponent marker is a letter too, so the normalizer parses
//! the leading numeric literal explicitly and discards whatever unit
//! follows.

use once_cell::sync::Lazy;
use regex::Regex;

/// Leading numeric literal: sign, digits, optional fraction, optional
/// exponent. Anything after it is treated as a unit suffix and dropped.
static LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?[0-9]+(?:\.[0-9]+)?(?:[eE][+-]?[0-9]+)?").expect("valid literal regex")
});

/// Strip the unit suffix off a duration token and parse the number.
///
/// Idempotent over already-plain numerics; returns `None` when the token
/// does not start with a numeric literal.
pub fn normalize_duration(token: &str) -> Option<f64> {
    let trimmed = token.trim();
    let matched = LEADING_NUMBER.find(trimmed)?;
    matched.as_str().parse::<f64>().ok()
}
