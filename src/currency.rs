//! JPY → CNY conversion.
//!
//! This is the single rounding site for the whole crate: the order factory
//! and any display-side caller both convert through [`to_cny`], so a stored
//! order total can never disagree with what the customer was shown.

/// Convert an integer JPY amount to CNY at `rate`, rounded to 2 decimal
/// places.
///
/// Rounding is round-half-away-from-zero (`f64::round` semantics).
pub fn to_cny(amount_jpy: i64, rate: f64) -> f64 {
    (amount_jpy as f64 * rate * 100.0).round() / 100.0
}
